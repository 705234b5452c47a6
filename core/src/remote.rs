//! Dispatch to the real network.
//!
//! # Design
//! One blocking `ureq::Agent` is shared by the whole process. It keeps the
//! library's default transport policy (redirects, TLS, no timeouts) except
//! that error statuses come back as responses: a 404 is data for the script,
//! not a transport failure. Every problem after routing is recorded in the
//! `Response`, never returned as an error.

use std::io::Read;
use std::sync::OnceLock;

use http::StatusCode;

use crate::config::FetchConfig;
use crate::error::DispatchError;
use crate::options::RequestOptions;
use crate::response::{headers_from_map, Response};

static SHARED_AGENT: OnceLock<ureq::Agent> = OnceLock::new();

/// The process-wide HTTP client.
pub fn shared_agent() -> ureq::Agent {
    SHARED_AGENT
        .get_or_init(|| {
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent()
        })
        .clone()
}

/// Status line in `"<code> <reason>"` form, e.g. `"404 Not Found"`.
pub fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

/// Executes requests over the network through a shared agent.
#[derive(Clone)]
pub struct RemoteDispatcher {
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl Default for RemoteDispatcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl RemoteDispatcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            agent: shared_agent(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Execute `opts` against `url` and always produce a `Response`.
    pub fn fetch(&self, url: &str, opts: &RequestOptions) -> Response {
        let mut result = Response::for_request(opts);

        let mut builder = http::Request::builder().method(opts.method.as_str()).uri(url);
        for (name, values) in &opts.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let sent = match opts.outgoing_body() {
            Some(body) => builder
                .body(body.to_string())
                .map(|req| self.agent.run(req)),
            None => builder.body(()).map(|req| self.agent.run(req)),
        };

        let mut response = match sent {
            Err(e) => {
                result.record(DispatchError::InvalidRequest(e));
                return result;
            }
            Ok(Err(e)) => {
                result.record(DispatchError::Transport(e));
                return result;
            }
            Ok(Ok(response)) => response,
        };

        result.status = response.status().as_u16();
        result.status_text = status_line(response.status());
        result.headers = headers_from_map(response.headers());

        // The response owns the connection; it is released when dropped at
        // the end of this scope whether or not the read succeeds.
        let (bytes, err) = read_limited(response.body_mut().as_reader(), self.max_body_bytes);
        result.body = String::from_utf8_lossy(&bytes).into_owned();
        if let Some(e) = err {
            result.record(e);
        }

        tracing::debug!(url, status = result.status, "remote dispatch complete");
        result
    }
}

/// Read at most `limit` bytes. Whatever was read before a failure is kept.
fn read_limited(reader: impl Read, limit: u64) -> (Vec<u8>, Option<DispatchError>) {
    let mut bytes = Vec::new();
    if let Err(e) = reader.take(limit.saturating_add(1)).read_to_end(&mut bytes) {
        return (bytes, Some(DispatchError::BodyRead(e)));
    }
    if bytes.len() as u64 > limit {
        bytes.truncate(limit as usize);
        return (bytes, Some(DispatchError::BodyTooLarge { limit }));
    }
    (bytes, None)
}

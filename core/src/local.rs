//! Dispatch to an in-process handler.
//!
//! # Design
//! The request is synthesized as if it had arrived from a listener and the
//! handler answers into a `ResponseRecorder`, so no socket is involved. The
//! only failure modes are a missing handler and a request that cannot be
//! built; anything the handler does after that is its own business.

use http::header::HeaderValue;

use crate::error::DispatchError;
use crate::handler::{Handler, LocalRequest, ResponseRecorder};
use crate::options::RequestOptions;
use crate::response::{headers_from_map, Response};

/// Header set on every locally dispatched request.
pub const LOCAL_MARKER_HEADER: &str = "x-forwarded-for";

/// Value of [`LOCAL_MARKER_HEADER`] identifying bridge-originated requests.
pub const LOCAL_MARKER_VALUE: &str = "<local>";

/// Build the request a local handler sees.
///
/// Caller headers are applied first, then the marker header replaces any
/// caller value for that name.
pub fn synthesize_request(url: &str, opts: &RequestOptions) -> Result<LocalRequest, DispatchError> {
    let mut builder = http::Request::builder().method(opts.method.as_str()).uri(url);
    for (name, values) in &opts.headers {
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    let body = opts.outgoing_body().unwrap_or_default().to_string();
    let mut request = builder.body(body)?;
    request.headers_mut().insert(
        LOCAL_MARKER_HEADER,
        HeaderValue::from_static(LOCAL_MARKER_VALUE),
    );
    Ok(request)
}

/// Execute `opts` against `handler` and always produce a `Response`.
pub fn fetch_local(handler: Option<&dyn Handler>, url: &str, opts: &RequestOptions) -> Response {
    let mut result = Response::for_request(opts);

    let Some(handler) = handler else {
        result.record(DispatchError::HandlerUnset);
        return result;
    };

    let mut request = match synthesize_request(url, opts) {
        Ok(req) => req,
        Err(e) => {
            result.record(e);
            return result;
        }
    };

    let mut recorder = ResponseRecorder::new();
    handler.serve(&mut recorder, &mut request);

    result.status = recorder.status().as_u16();
    result.headers = headers_from_map(recorder.headers());
    result.body = recorder.body_string();
    tracing::debug!(url, status = result.status, "local dispatch complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, Mux};
    use crate::options::Headers;
    use http::StatusCode;
    use std::io::Write;

    fn opts(url: &str) -> RequestOptions {
        RequestOptions {
            url: url.to_string(),
            ..Default::default()
        }
        .normalized()
    }

    fn test_mux() -> Mux {
        let mut mux = Mux::new();
        mux.handle(
            "/foo",
            handler_fn(|w, _| {
                w.headers_mut()
                    .insert("x-answer", HeaderValue::from_static("42"));
                write!(w, "got foo").unwrap();
            }),
        );
        mux
    }

    #[test]
    fn local_fetch_captures_handler_output() {
        let mux = test_mux();
        let resp = fetch_local(Some(&mux), "/foo", &opts("/foo"));
        assert_eq!(resp.status, 200);
        assert_eq!(
            resp.headers,
            Headers::from([("x-answer".to_string(), vec!["42".to_string()])])
        );
        assert_eq!(resp.body, "got foo");
        assert!(resp.errors.is_empty());
        assert!(resp.status_text.is_empty());
        assert_eq!(resp.url, "/foo");
        assert_eq!(resp.method, "GET");
    }

    #[test]
    fn local_fetch_unknown_path_is_404() {
        let mux = test_mux();
        let resp = fetch_local(Some(&mux), "/missing", &opts("/missing"));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, "404 page not found\n");
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn missing_handler_is_soft_failure() {
        let mut o = opts("/foo");
        o.body = "ignored".to_string();
        o.method = "POST".to_string();
        let resp = fetch_local(None, "/foo", &o);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.errors, vec!["local handler isn't set".to_string()]);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn marker_header_overwrites_caller_value() {
        let mut o = opts("/who");
        o.headers.insert(
            "X-Forwarded-For".to_string(),
            vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
        );
        let req = synthesize_request("/who", &o).unwrap();
        let values: Vec<_> = req.headers().get_all(LOCAL_MARKER_HEADER).iter().collect();
        assert_eq!(values, vec![LOCAL_MARKER_VALUE]);
    }

    #[test]
    fn caller_headers_reach_the_handler() {
        let handler = handler_fn(|w, r| {
            let favorite = r
                .headers()
                .get("x-favorite-number")
                .cloned()
                .unwrap_or(HeaderValue::from_static("none"));
            w.headers_mut().insert("x-answer", favorite);
        });
        let mut o = opts("/foo");
        o.headers
            .insert("x-favorite-number".to_string(), vec!["42".to_string()]);
        let resp = fetch_local(Some(&handler), "/foo", &o);
        assert_eq!(resp.header("x-answer"), Some("42"));
    }

    #[test]
    fn body_only_sent_for_body_methods() {
        let handler = handler_fn(|w, r| {
            let body = r.body().clone();
            w.write_body(body.as_bytes());
        });

        let mut post = opts("/echo");
        post.method = "POST".to_string();
        post.body = "payload".to_string();
        assert_eq!(fetch_local(Some(&handler), "/echo", &post).body, "payload");

        let mut get = opts("/echo");
        get.body = "payload".to_string();
        assert_eq!(fetch_local(Some(&handler), "/echo", &get).body, "");
    }

    #[test]
    fn handler_status_is_reported() {
        let handler = handler_fn(|w, _| w.set_status(StatusCode::CREATED));
        let resp = fetch_local(Some(&handler), "/new", &opts("/new"));
        assert_eq!(resp.status, 201);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn malformed_method_is_soft_failure() {
        let mut o = opts("/foo");
        o.method = "NOT VALID".to_string();
        let resp = fetch_local(Some(&test_mux()), "/foo", &o);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.errors.len(), 1);
        assert!(resp.errors[0].starts_with("invalid request"));
    }

    #[test]
    fn malformed_url_is_soft_failure() {
        let resp = fetch_local(Some(&test_mux()), "/has space", &opts("/has space"));
        assert_eq!(resp.status, 500);
        assert_eq!(resp.errors.len(), 1);
    }
}

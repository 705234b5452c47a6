//! The normalized result of one dispatch.
//!
//! # Design
//! A `Response` starts life as an echo of the request's url, method and
//! headers with the 500 sentinel status and an empty body. Dispatchers
//! overwrite `headers` with what the target sent back, so the script side
//! sees the same flat shape whether the call went to the network or to the
//! local handler.

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::options::{Headers, RequestOptions};

/// Status reported when no response was obtained at all.
pub const SENTINEL_STATUS: u16 = 500;

/// The outcome of a single dispatch attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub url: String,
    pub method: String,
    /// Request headers until a dispatch succeeds, then the response headers.
    pub headers: Headers,
    pub body: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status_text: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Response {
    /// A response that echoes `opts` and has not been dispatched yet.
    pub fn for_request(opts: &RequestOptions) -> Self {
        Self {
            url: opts.url.clone(),
            method: opts.method.clone(),
            headers: opts.headers.clone(),
            body: String::new(),
            status: SENTINEL_STATUS,
            status_text: String::new(),
            errors: Vec::new(),
        }
    }

    /// Append a soft failure in detection order.
    pub fn record(&mut self, err: DispatchError) {
        tracing::warn!(error = %err, url = %self.url, "dispatch error recorded");
        self.errors.push(err.to_string());
    }

    /// True when no soft failure was recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Case-insensitive lookup of the first value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// Flatten an `http::HeaderMap` into the echo-friendly map form.
///
/// Non-UTF-8 header values are converted lossily.
pub fn headers_from_map(map: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in map {
        out.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, SET_COOKIE};

    fn opts() -> RequestOptions {
        RequestOptions {
            url: "/echo".to_string(),
            method: "POST".to_string(),
            headers: Headers::from([("x-id".to_string(), vec!["7".to_string()])]),
            body: "hello".to_string(),
        }
    }

    #[test]
    fn new_response_echoes_request_with_sentinel_status() {
        let resp = Response::for_request(&opts());
        assert_eq!(resp.url, "/echo");
        assert_eq!(resp.method, "POST");
        assert_eq!(resp.headers["x-id"], vec!["7"]);
        assert!(resp.body.is_empty());
        assert_eq!(resp.status, 500);
        assert!(resp.status_text.is_empty());
        assert!(resp.errors.is_empty());
        assert!(resp.is_ok());
    }

    #[test]
    fn errors_accumulate_in_order() {
        let mut resp = Response::for_request(&opts());
        resp.record(DispatchError::HandlerUnset);
        resp.errors.push("second".to_string());
        assert_eq!(resp.errors.len(), 2);
        assert_eq!(resp.errors[1], "second");
        assert!(!resp.is_ok());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let mut resp = Response::for_request(&opts());
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("statusText").is_none());
        assert_eq!(json["errors"], serde_json::json!([]));
        assert_eq!(json["status"], 500);

        resp.status_text = "200 OK".to_string();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["statusText"], "200 OK");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = Response::for_request(&opts());
        assert_eq!(resp.header("X-ID"), Some("7"));
        assert_eq!(resp.header("missing"), None);
    }

    #[test]
    fn header_map_keeps_repeated_values() {
        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        let headers = headers_from_map(&map);
        assert_eq!(headers["set-cookie"], vec!["a=1", "b=2"]);
    }
}

//! Error types for the fetch bridge.
//!
//! # Design
//! Two channels that never mix. `BridgeError` aborts a bridge call and no
//! `Response` exists. `DispatchError` describes something that went wrong
//! after routing succeeded; it is rendered into `Response::errors` and the
//! call still returns normally.

use thiserror::Error;

/// Hard failures that abort a bridge call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge was called with the wrong number of arguments.
    #[error("expected {expected} args (url, options), got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// The options argument is not JSON of the expected shape.
    #[error("cannot decode JSON options: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    /// The URL is neither http(s), protocol-relative, nor path-absolute.
    #[error("only http(s) or local (path-absolute) URLs are supported: {0}")]
    UnsupportedScheme(String),

    /// The response could not be turned into a boundary value.
    #[error("cannot encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Soft failures recorded inside a `Response`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("local handler isn't set")]
    HandlerUnset,

    /// Method, URL or a header could not form a valid request.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("{0}")]
    Transport(#[source] ureq::Error),

    #[error("reading response body: {0}")]
    BodyRead(#[source] std::io::Error),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

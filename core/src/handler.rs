//! In-process request handling.
//!
//! # Design
//! A `Handler` is anything that can answer a request without a socket: it
//! reads a `LocalRequest` and writes status, headers and body into a
//! `ResponseRecorder`. Handlers take the request mutably so wrappers can
//! decorate it before delegating. `Mux` routes by path the way a stock HTTP
//! server multiplexer does, and answers unmatched paths with a plain 404.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, StatusCode};

/// The request a local handler receives.
pub type LocalRequest = http::Request<String>;

/// Something that can serve a request in-process and synchronously.
pub trait Handler: Send + Sync {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest);
}

/// Adapts a plain function or closure into a `Handler`.
pub struct HandlerFn<F>(pub F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut ResponseRecorder, &mut LocalRequest) + Send + Sync,
{
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        (self.0)(recorder, request)
    }
}

/// Shorthand for `HandlerFn(f)` that pins down the closure's signature.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut ResponseRecorder, &mut LocalRequest) + Send + Sync,
{
    HandlerFn(f)
}

impl Handler for Box<dyn Handler> {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        (**self).serve(recorder, request)
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        (**self).serve(recorder, request)
    }
}

/// In-memory capture of what a handler answered.
///
/// Status starts at 200, so a handler that only writes a body succeeds.
#[derive(Debug, Clone)]
pub struct ResponseRecorder {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Append raw bytes to the body.
    pub fn write_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// The body as text; invalid UTF-8 is replaced.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl io::Write for ResponseRecorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reply with a plain-text error body, the way a stock server does.
pub fn plain_error(recorder: &mut ResponseRecorder, message: &str, status: StatusCode) {
    let headers = recorder.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    recorder.set_status(status);
    recorder.write_body(message.as_bytes());
    recorder.write_body(b"\n");
}

/// Path-based request router.
///
/// A pattern without a trailing slash matches that path only. A pattern
/// ending in `/` matches every path below it. The longest matching pattern
/// wins.
#[derive(Default)]
pub struct Mux {
    routes: HashMap<String, Box<dyn Handler>>,
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `pattern`, replacing any earlier registration.
    pub fn handle(&mut self, pattern: &str, handler: impl Handler + 'static) -> &mut Self {
        self.routes.insert(pattern.to_string(), Box::new(handler));
        self
    }

    fn lookup(&self, path: &str) -> Option<&dyn Handler> {
        if let Some(h) = self.routes.get(path) {
            return Some(h.as_ref());
        }
        self.routes
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, h)| h.as_ref())
    }
}

impl Handler for Mux {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        let path = request.uri().path().to_string();
        match self.lookup(&path) {
            Some(handler) => handler.serve(recorder, request),
            None => {
                tracing::debug!(%path, "no local route");
                plain_error(recorder, "404 page not found", StatusCode::NOT_FOUND)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn get(path: &str) -> LocalRequest {
        http::Request::builder()
            .uri(path)
            .body(String::new())
            .unwrap()
    }

    fn serve(h: &impl Handler, path: &str) -> ResponseRecorder {
        let mut rec = ResponseRecorder::new();
        h.serve(&mut rec, &mut get(path));
        rec
    }

    #[test]
    fn recorder_defaults_to_ok_and_empty() {
        let rec = ResponseRecorder::new();
        assert_eq!(rec.status(), StatusCode::OK);
        assert!(rec.headers().is_empty());
        assert_eq!(rec.body_string(), "");
    }

    #[test]
    fn recorder_accepts_write_macro() {
        let mut rec = ResponseRecorder::new();
        write!(rec, "got {}", "foo").unwrap();
        assert_eq!(rec.body_string(), "got foo");
    }

    #[test]
    fn mux_routes_exact_path() {
        let mut mux = Mux::new();
        mux.handle("/foo", handler_fn(|w, _| w.write_body(b"foo")));
        assert_eq!(serve(&mux, "/foo").body_string(), "foo");
        assert_eq!(serve(&mux, "/foo/bar").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn mux_subtree_prefers_longest_pattern() {
        let mut mux = Mux::new();
        mux.handle("/", handler_fn(|w, _| w.write_body(b"root")))
            .handle("/api/", handler_fn(|w, _| w.write_body(b"api")));
        assert_eq!(serve(&mux, "/api/users").body_string(), "api");
        assert_eq!(serve(&mux, "/other").body_string(), "root");
    }

    #[test]
    fn mux_ignores_query_when_matching() {
        let mut mux = Mux::new();
        mux.handle(
            "/q",
            handler_fn(|w, r| w.write_body(r.uri().query().unwrap_or("").as_bytes())),
        );
        assert_eq!(serve(&mux, "/q?a=1").body_string(), "a=1");
    }

    #[test]
    fn mux_not_found_is_plain_text() {
        let rec = serve(&Mux::new(), "/missing");
        assert_eq!(rec.status(), StatusCode::NOT_FOUND);
        assert_eq!(rec.body_string(), "404 page not found\n");
        assert_eq!(
            rec.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}

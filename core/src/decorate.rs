//! Handler wrappers that add headers to every request before delegating.
//!
//! # Design
//! Both wrappers are the same adapter, `InjectHeaders`, parameterized by
//! where the extra headers come from. Injection is always additive: values
//! already on the request stay, the injected ones are appended after them.
//! Wrappers are handlers themselves, so they nest.

use http::header::COOKIE;
use http::HeaderMap;

use crate::handler::{Handler, LocalRequest, ResponseRecorder};

/// A fixed source of headers to add to a request.
pub trait HeaderSource: Send + Sync {
    fn inject(&self, headers: &mut HeaderMap);
}

/// A fixed header set; every value of every name is appended.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(pub HeaderMap);

impl HeaderSource for StaticHeaders {
    fn inject(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.0 {
            headers.append(name.clone(), value.clone());
        }
    }
}

/// The `Cookie` headers of a reference request, e.g. the client request
/// that triggered server-side rendering.
#[derive(Debug)]
pub struct ReferenceCookies(pub http::Request<()>);

impl HeaderSource for ReferenceCookies {
    fn inject(&self, headers: &mut HeaderMap) {
        for value in self.0.headers().get_all(COOKIE) {
            headers.append(COOKIE, value.clone());
        }
    }
}

/// Wraps a handler and injects headers from `S` into each request.
#[derive(Debug)]
pub struct InjectHeaders<H, S> {
    inner: H,
    source: S,
}

impl<H, S> InjectHeaders<H, S> {
    pub fn new(inner: H, source: S) -> Self {
        Self { inner, source }
    }
}

impl<H: Handler, S: HeaderSource> Handler for InjectHeaders<H, S> {
    fn serve(&self, recorder: &mut ResponseRecorder, request: &mut LocalRequest) {
        self.source.inject(request.headers_mut());
        self.inner.serve(recorder, request)
    }
}

/// Adds a fixed set of headers to every request.
pub type AddHeaders<H> = InjectHeaders<H, StaticHeaders>;

/// Copies the cookies of a reference request onto every request.
pub type AddCookieHeader<H> = InjectHeaders<H, ReferenceCookies>;

impl<H> AddHeaders<H> {
    pub fn with_headers(inner: H, headers: HeaderMap) -> Self {
        Self::new(inner, StaticHeaders(headers))
    }
}

impl<H> AddCookieHeader<H> {
    pub fn from_reference(inner: H, reference: http::Request<()>) -> Self {
        Self::new(inner, ReferenceCookies(reference))
    }
}

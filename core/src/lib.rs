//! Synchronous fetch dispatcher for embedded script sandboxes.
//!
//! # Overview
//! A script running inside a sandbox has no network of its own. The host
//! exposes one blocking call, `Fetcher::fetch_sync(url, options_json)`, which
//! decides whether the request goes to the real network or to an in-process
//! `Handler`, runs it, and hands back a flat JSON `Response`.
//!
//! # Design
//! - `Route::classify` is a prefix test: `http`/`//` is remote, `/` is local,
//!   anything else is a hard `BridgeError`.
//! - Both dispatchers always return a `Response`. Problems after routing are
//!   collected in `Response::errors` and the status stays at 500 unless a
//!   real one was obtained.
//! - Remote requests share one process-wide `ureq::Agent`.
//! - `AddHeaders` and `AddCookieHeader` wrap a local handler to inject
//!   headers into every request it sees.

pub mod bridge;
pub mod config;
pub mod decorate;
pub mod error;
pub mod handler;
pub mod local;
pub mod options;
pub mod remote;
pub mod response;
pub mod router;

pub use config::FetchConfig;
pub use decorate::{AddCookieHeader, AddHeaders, HeaderSource, InjectHeaders};
pub use error::{BridgeError, DispatchError};
pub use handler::{handler_fn, Handler, HandlerFn, LocalRequest, Mux, ResponseRecorder};
pub use options::{Headers, RequestOptions};
pub use response::Response;
pub use router::{Fetcher, Route};

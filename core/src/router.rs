//! URL classification and dispatch.
//!
//! # Design
//! Classification is a prefix test, not a URL parse: anything starting with
//! `http` or `//` goes to the network, anything else starting with `/` goes
//! to the local handler, and everything else is refused before any work is
//! done.

use uuid::Uuid;

use crate::config::FetchConfig;
use crate::error::BridgeError;
use crate::handler::Handler;
use crate::local::fetch_local;
use crate::options::RequestOptions;
use crate::remote::RemoteDispatcher;
use crate::response::Response;

/// Which dispatcher a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Remote,
    Local,
}

impl Route {
    pub fn classify(url: &str) -> Result<Self, BridgeError> {
        if url.starts_with("http") || url.starts_with("//") {
            Ok(Route::Remote)
        } else if url.starts_with('/') {
            Ok(Route::Local)
        } else {
            Err(BridgeError::UnsupportedScheme(url.to_string()))
        }
    }
}

/// Routes requests to the network or to an optional in-process handler.
pub struct Fetcher {
    local: Option<Box<dyn Handler>>,
    remote: RemoteDispatcher,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Fetcher {
    /// A fetcher with default configuration. Without a local handler every
    /// path-absolute URL fails softly.
    pub fn new(local: Option<Box<dyn Handler>>) -> Self {
        Self::with_config(local, &FetchConfig::default())
    }

    pub fn with_config(local: Option<Box<dyn Handler>>, config: &FetchConfig) -> Self {
        Self {
            local,
            remote: RemoteDispatcher::new(config),
        }
    }

    /// A fetcher serving path-absolute URLs from `handler`.
    pub fn with_handler(handler: impl Handler + 'static) -> Self {
        Self::new(Some(Box::new(handler)))
    }

    pub fn has_local_handler(&self) -> bool {
        self.local.is_some()
    }

    /// Classify `url` and run exactly one dispatch attempt.
    ///
    /// Only an unsupported scheme is an error; everything that goes wrong
    /// during the dispatch itself is reported inside the `Response`.
    pub fn fetch(&self, url: &str, opts: &RequestOptions) -> Result<Response, BridgeError> {
        let route = Route::classify(url)?;
        let span = tracing::debug_span!("fetch", id = %Uuid::new_v4(), ?route, url, method = %opts.method);
        let _guard = span.enter();
        tracing::debug!("dispatching");

        Ok(match route {
            Route::Remote => self.remote.fetch(url, opts),
            Route::Local => fetch_local(self.local.as_deref(), url, opts),
        })
    }
}

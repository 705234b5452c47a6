//! Runtime configuration for the fetch bridge.

/// Environment variable overriding [`FetchConfig::max_body_bytes`].
pub const MAX_BODY_ENV: &str = "FETCH_BRIDGE_MAX_BODY_BYTES";

/// Default cap on a buffered remote response body (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Settings shared by every dispatch of a `Fetcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Remote bodies larger than this are a read error.
    pub max_body_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl FetchConfig {
    /// Defaults, overridden by the process environment where set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable values are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_BODY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(n) => config.max_body_bytes = n,
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring {MAX_BODY_ENV}"),
            }
        }
        config
    }
}

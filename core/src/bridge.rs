//! The single synchronous call exposed to an embedded script host.
//!
//! The host passes primitive strings in and gets a JSON value back. How that
//! value becomes a script object, and how the blocking call is presented as
//! a promise, is the host's concern.

use crate::error::BridgeError;
use crate::options::RequestOptions;
use crate::router::Fetcher;

/// Number of arguments the bridge call takes: url and options JSON.
pub const BRIDGE_ARITY: usize = 2;

impl Fetcher {
    /// Run one fetch for `args = [url, options_json]`.
    ///
    /// Wrong arity, undecodable options and unsupported URLs are hard
    /// failures. Everything else comes back as a response value, with
    /// problems listed under `errors`.
    pub fn fetch_sync(&self, args: &[&str]) -> Result<serde_json::Value, BridgeError> {
        let [url, raw_opts] = args else {
            return Err(BridgeError::ArgumentCount {
                expected: BRIDGE_ARITY,
                got: args.len(),
            });
        };
        let opts = RequestOptions::from_json(raw_opts).map_err(BridgeError::InvalidOptions)?;
        let response = self.fetch(url, &opts)?;
        serde_json::to_value(&response).map_err(BridgeError::Encode)
    }
}

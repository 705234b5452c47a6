//! The normalized description of an outbound request.
//!
//! # Design
//! `RequestOptions` is decoded once per bridge call from the JSON the script
//! side hands over, then only ever borrowed by the dispatchers. Headers are
//! kept as plain owned strings so the same map can be echoed back in the
//! `Response` without touching `http` types.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Header name to every value sent for it, in order.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Method used when the caller leaves it out or sends an empty string.
pub const DEFAULT_METHOD: &str = "GET";

/// An outbound request as described by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// The target exactly as the caller wrote it; echoed back, not dispatched.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: Headers,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
}

impl RequestOptions {
    /// Decode options from the bridge's JSON argument and fill in defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let opts: RequestOptions = serde_json::from_str(raw)?;
        Ok(opts.normalized())
    }

    /// Apply the `GET` default to a missing or empty method.
    pub fn normalized(mut self) -> Self {
        if self.method.is_empty() {
            self.method = DEFAULT_METHOD.to_string();
        }
        self
    }

    /// Whether the method carries a request body at all.
    pub fn sends_body(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
    }

    /// The body to attach to the outgoing request, if the method allows one.
    pub fn outgoing_body(&self) -> Option<&str> {
        self.sends_body().then_some(self.body.as_str())
    }
}

/// A header value is usually a list, but fetch shims flatten single values
/// into a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// `null` reads as the field's default, the same as leaving it out.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<Headers, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<OneOrMany>> = null_as_default(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, values)| match values {
            None => (name, Vec::new()),
            Some(OneOrMany::One(v)) => (name, vec![v]),
            Some(OneOrMany::Many(vs)) => (name, vs),
        })
        .collect())
}

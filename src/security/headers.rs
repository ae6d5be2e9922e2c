//! Header scrubbing.
//!
//! # Responsibilities
//! - Export request headers for the scoring context
//! - Replace sensitive values (cookies, credentials) with an opaque marker
//!
//! # Design Decisions
//! - Keys are never dropped; only values are replaced
//! - The marker is the JSON boolean `true`
//! - Sensitive names compare case-insensitively
//! - Scrubbing is idempotent, so already scrubbed maps can be fed back in

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// A header value as exported to the scoring service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubbedValue {
    /// Original value, passed through.
    Plain(String),
    /// Value withheld; serialized as `true`.
    Scrubbed,
}

impl Serialize for ScrubbedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScrubbedValue::Plain(value) => serializer.serialize_str(value),
            ScrubbedValue::Scrubbed => serializer.serialize_bool(true),
        }
    }
}

impl From<&str> for ScrubbedValue {
    fn from(value: &str) -> Self {
        ScrubbedValue::Plain(value.to_string())
    }
}

impl From<String> for ScrubbedValue {
    fn from(value: String) -> Self {
        ScrubbedValue::Plain(value)
    }
}

impl From<&ScrubbedValue> for ScrubbedValue {
    fn from(value: &ScrubbedValue) -> Self {
        value.clone()
    }
}

/// Exported header mapping.
pub type ScrubbedHeaders = BTreeMap<String, ScrubbedValue>;

/// Set of header names whose values must not leave the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveHeaders {
    names: Vec<String>,
}

impl SensitiveHeaders {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

impl Default for SensitiveHeaders {
    fn default() -> Self {
        Self::new(["cookie", "authorization"])
    }
}

/// Build the exported header mapping, scrubbing every sensitive value.
///
/// The input is only borrowed; every key of the input appears in the output.
pub fn scrub<I, K, V>(headers: I, sensitive: &SensitiveHeaders) -> ScrubbedHeaders
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<ScrubbedValue>,
{
    headers
        .into_iter()
        .map(|(name, value)| {
            let name = name.as_ref();
            let value = if sensitive.contains(name) {
                ScrubbedValue::Scrubbed
            } else {
                value.into()
            };
            (name.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::HeaderList;

    fn sample() -> HeaderList {
        [
            ("Cookie", "session=abc"),
            ("authorization", "Bearer t0k3n"),
            ("user-agent", "Mozilla/5.0"),
            ("accept", "*/*"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scrub_sensitive() {
        let scrubbed = scrub(sample().iter(), &SensitiveHeaders::default());

        assert_eq!(scrubbed.len(), 4);
        assert_eq!(scrubbed["Cookie"], ScrubbedValue::Scrubbed);
        assert_eq!(scrubbed["authorization"], ScrubbedValue::Scrubbed);
        assert_eq!(scrubbed["user-agent"], ScrubbedValue::from("Mozilla/5.0"));
        assert_eq!(scrubbed["accept"], ScrubbedValue::from("*/*"));
    }

    #[test]
    fn test_input_untouched() {
        let headers = sample();
        let _ = scrub(headers.iter(), &SensitiveHeaders::default());
        assert_eq!(headers, sample());
        assert_eq!(headers.get("cookie"), Some("session=abc"));
    }

    #[test]
    fn test_idempotent() {
        let sensitive = SensitiveHeaders::new(["COOKIE", "x-api-key"]);
        let once = scrub(sample().iter(), &sensitive);
        let twice = scrub(&once, &sensitive);
        assert_eq!(once, twice);
        assert_eq!(once["Cookie"], ScrubbedValue::Scrubbed);
        // Not in this set
        assert_eq!(once["authorization"], ScrubbedValue::from("Bearer t0k3n"));
    }

    #[test]
    fn test_serializes_marker_as_true() {
        let scrubbed = scrub(sample().iter(), &SensitiveHeaders::default());
        let json = serde_json::to_value(&scrubbed).unwrap();
        assert_eq!(json["Cookie"], serde_json::Value::Bool(true));
        assert_eq!(json["user-agent"], "Mozilla/5.0");
    }

    #[test]
    fn test_empty() {
        let scrubbed = scrub(HeaderList::new().iter(), &SensitiveHeaders::default());
        assert!(scrubbed.is_empty());
    }
}

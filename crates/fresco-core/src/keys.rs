//! Ordered cache-key descriptors.
//!
//! A [`QueryKey`] identifies a logical cached resource as an ordered sequence
//! of string segments, e.g. `["orders", "all"]`. The key scheme is
//! hierarchical: `["orders"]` is a prefix of `["orders", "all"]`, so
//! invalidating the shorter key also invalidates everything under it.
//!
//! Wire form is a JSON array of strings. Anything else — a bare string, an
//! empty array, an array with non-string elements — is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EventParseError;

/// Ordered sequence of string segments identifying a cached resource.
///
/// Equality and hashing cover the full ordered sequence. Keys are non-empty
/// by construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Build a key from segments.
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError::EmptyKey`] if `segments` is empty.
    pub fn new<I, S>(segments: I) -> Result<Self, EventParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(EventParseError::EmptyKey);
        }
        Ok(Self(segments))
    }

    /// Parse a key from its JSON wire form (an array of strings).
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError::MalformedKey`] if `value` is not an array of
    /// strings, or [`EventParseError::EmptyKey`] if the array is empty.
    pub fn from_wire(value: &serde_json::Value) -> Result<Self, EventParseError> {
        let serde_json::Value::Array(items) = value else {
            return Err(EventParseError::MalformedKey {
                detail: format!("expected array, got {}", type_name(value)),
            });
        };
        let mut segments = Vec::with_capacity(items.len());
        for item in items {
            match item {
                serde_json::Value::String(s) => segments.push(s.clone()),
                other => {
                    return Err(EventParseError::MalformedKey {
                        detail: format!("expected string segment, got {}", type_name(other)),
                    });
                }
            }
        }
        Self::new(segments)
    }

    /// The key segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with collection types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `self` is a (non-strict) prefix of `other`.
    ///
    /// `["orders"]` is a prefix of `["orders", "all"]` and of itself.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl TryFrom<Vec<String>> for QueryKey {
    type Error = EventParseError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<QueryKey> for Vec<String> {
    fn from(key: QueryKey) -> Self {
        key.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// JSON value type name for error messages.
pub(crate) fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

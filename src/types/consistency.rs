//! ConsistencyToken anchoring checks to a tuple-store snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An opaque token issued by the authorization backend for a snapshot point
/// of its tuple store.
///
/// Tokens are produced by tuple writes and by write-consistency checks. The
/// orchestrator attaches them to a [`Resource`](crate::Resource) and persists
/// them through the store; it never creates or mutates one on its own.
///
/// ## Serialization
///
/// On the wire a token is an object with a single `token` field:
///
/// ```rust
/// use inventory_authz::ConsistencyToken;
///
/// let token = ConsistencyToken::new("GhUKEzE3MDAwMDAwMDAwMDAwMDAw");
/// let json = serde_json::to_string(&token).unwrap();
/// assert_eq!(json, r#"{"token":"GhUKEzE3MDAwMDAwMDAwMDAwMDAw"}"#);
///
/// let parsed: ConsistencyToken = "GhUKEzE3MDAwMDAwMDAwMDAwMDAw".parse().unwrap();
/// assert_eq!(token, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsistencyToken {
    /// The opaque token value.
    #[serde(rename = "token")]
    value: String,
}

impl ConsistencyToken {
    /// Creates a new consistency token from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the raw token value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the token and returns the inner value.
    #[inline]
    pub fn into_value(self) -> String {
        self.value
    }

    /// Returns `true` if the token value is empty.
    ///
    /// The backend sends an empty token when it has no snapshot to report;
    /// such a token is never persisted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for ConsistencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for ConsistencyToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::invalid_argument("consistency token cannot be empty"));
        }
        Ok(ConsistencyToken::new(s))
    }
}

impl From<String> for ConsistencyToken {
    fn from(value: String) -> Self {
        ConsistencyToken::new(value)
    }
}

impl From<&str> for ConsistencyToken {
    fn from(value: &str) -> Self {
        ConsistencyToken::new(value)
    }
}

impl AsRef<str> for ConsistencyToken {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_token_new() {
        let token = ConsistencyToken::new("abc123");
        assert_eq!(token.value(), "abc123");
        assert!(!token.is_empty());
        assert!(ConsistencyToken::new("").is_empty());
    }

    #[test]
    fn test_consistency_token_display() {
        let token = ConsistencyToken::new("xyz789");
        assert_eq!(token.to_string(), "xyz789");
    }

    #[test]
    fn test_consistency_token_from_str_empty() {
        let result = "".parse::<ConsistencyToken>();
        assert!(result.is_err());
    }

    #[test]
    fn test_consistency_token_wire_format() {
        let token: ConsistencyToken = serde_json::from_str(r#"{"token":"snap-42"}"#).unwrap();
        assert_eq!(token.value(), "snap-42");
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            serde_json::json!({"token": "snap-42"})
        );
    }

    #[test]
    fn test_into_value_and_as_ref() {
        let token = ConsistencyToken::from(String::from("owned_value"));
        let s: &str = token.as_ref();
        assert_eq!(s, "owned_value");
        assert_eq!(token.into_value(), "owned_value");
    }
}

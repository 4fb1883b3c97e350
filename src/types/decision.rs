//! Decision types for authorization check results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ConsistencyToken;

/// Tri-state outcome of a single permission check.
///
/// `Unspecified` only ever accompanies a failed check; a successful check is
/// either `True` or `False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Allowed {
    /// The backend did not reach a decision.
    #[default]
    #[serde(rename = "ALLOWED_UNSPECIFIED")]
    Unspecified,

    /// Access is granted.
    #[serde(rename = "ALLOWED_TRUE")]
    True,

    /// Access is denied.
    #[serde(rename = "ALLOWED_FALSE")]
    False,
}

impl fmt::Display for Allowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowed::Unspecified => write!(f, "unspecified"),
            Allowed::True => write!(f, "allowed"),
            Allowed::False => write!(f, "denied"),
        }
    }
}

impl From<bool> for Allowed {
    fn from(allowed: bool) -> Self {
        if allowed { Allowed::True } else { Allowed::False }
    }
}

/// An authorization decision plus the snapshot it was evaluated at.
///
/// ```rust
/// use inventory_authz::{Allowed, ConsistencyToken, Decision};
///
/// let decision = Decision::allowed().with_consistency_token(ConsistencyToken::new("t1"));
/// assert!(decision.is_allowed());
/// assert_eq!(decision.allowed_state(), Allowed::True);
///
/// // Only an explicit allow counts; unspecified is treated as "not allowed".
/// assert!(!Decision::new(Allowed::Unspecified).is_allowed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// The tri-state outcome.
    #[serde(default)]
    allowed: Allowed,

    /// Consistency token for this decision.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    consistency_token: Option<ConsistencyToken>,
}

impl Decision {
    /// Creates a new decision with the given outcome.
    pub fn new(allowed: Allowed) -> Self {
        Self {
            allowed,
            consistency_token: None,
        }
    }

    /// Creates an "allowed" decision.
    pub fn allowed() -> Self {
        Self::new(Allowed::True)
    }

    /// Creates a "denied" decision.
    pub fn denied() -> Self {
        Self::new(Allowed::False)
    }

    /// Returns the tri-state outcome.
    #[inline]
    pub fn allowed_state(&self) -> Allowed {
        self.allowed
    }

    /// Returns `true` only for an explicit allow.
    #[inline]
    pub fn is_allowed(&self) -> bool {
        self.allowed == Allowed::True
    }

    /// Returns the consistency token for this decision.
    ///
    /// Empty tokens are reported as `None`.
    pub fn consistency_token(&self) -> Option<&ConsistencyToken> {
        self.consistency_token.as_ref().filter(|t| !t.is_empty())
    }

    /// Returns the consistency token exactly as the backend sent it,
    /// including an empty one.
    pub fn returned_consistency_token(&self) -> Option<&ConsistencyToken> {
        self.consistency_token.as_ref()
    }

    /// Sets the consistency token for this decision.
    #[must_use]
    pub fn with_consistency_token(mut self, token: ConsistencyToken) -> Self {
        self.consistency_token = Some(token);
        self
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        Decision::new(allowed.into())
    }
}

impl From<Decision> for bool {
    fn from(decision: Decision) -> Self {
        decision.is_allowed()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.allowed)?;
        if let Some(token) = self.consistency_token() {
            write!(f, " at {}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Allowed::True, true ; "explicit allow")]
    #[test_case(Allowed::False, false ; "explicit deny")]
    #[test_case(Allowed::Unspecified, false ; "unspecified")]
    fn test_is_allowed(state: Allowed, expected: bool) {
        assert_eq!(Decision::new(state).is_allowed(), expected);
    }

    #[test]
    fn test_allowed_wire_names() {
        assert_eq!(
            serde_json::to_string(&Allowed::True).unwrap(),
            r#""ALLOWED_TRUE""#
        );
        assert_eq!(
            serde_json::from_str::<Allowed>(r#""ALLOWED_FALSE""#).unwrap(),
            Allowed::False
        );
        assert_eq!(Allowed::default(), Allowed::Unspecified);
    }

    #[test]
    fn test_decision_deserialize() {
        let json = r#"{"allowed":"ALLOWED_TRUE","consistencyToken":{"token":"abc"}}"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.consistency_token().map(|t| t.value()), Some("abc"));
    }

    #[test]
    fn test_decision_missing_fields_default_to_unspecified() {
        let decision: Decision = serde_json::from_str("{}").unwrap();
        assert_eq!(decision.allowed_state(), Allowed::Unspecified);
        assert!(decision.consistency_token().is_none());
    }

    #[test]
    fn test_empty_token_is_none() {
        let decision = Decision::denied().with_consistency_token(ConsistencyToken::new(""));
        assert!(decision.consistency_token().is_none());
        assert_eq!(
            decision.returned_consistency_token(),
            Some(&ConsistencyToken::new(""))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Decision::denied().to_string(), "denied");
        let decision = Decision::allowed().with_consistency_token("t9".into());
        assert_eq!(decision.to_string(), "allowed at t9");
    }

    #[test]
    fn test_bool_conversions() {
        let decision: Decision = true.into();
        assert!(bool::from(decision));
        assert!(!bool::from(Decision::from(false)));
    }
}

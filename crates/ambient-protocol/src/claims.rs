//! Identity types supplied by the authentication subsystem.
//!
//! The ambient context pipeline only reads from an [`Identity`]:
//!   1. `UserType = Parent` marks a caller whose context comes from claims
//!   2. `PrimaryHouseholdId` carries the household id
//!   3. `PersonId` carries the person id

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Claim Names
// ─────────────────────────────────────────────────────────────────────────────

/// Claim type holding the caller's role marker.
pub const USER_TYPE_CLAIM: &str = "UserType";

/// Role marker value that makes a caller's claims the context source.
pub const TRUSTED_USER_TYPE: &str = "Parent";

/// Claim type holding the household id.
pub const HOUSEHOLD_ID_CLAIM: &str = "PrimaryHouseholdId";

/// Claim type holding the person id.
pub const PERSON_ID_CLAIM: &str = "PersonId";

// ─────────────────────────────────────────────────────────────────────────────
// Claim Set
// ─────────────────────────────────────────────────────────────────────────────

/// A single `(type, value)` assertion about the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Verified identity of the current caller.
///
/// Immutable for the lifetime of a request. Requests with no credentials
/// carry [`Identity::anonymous`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Whether the identity subsystem authenticated the caller
    #[serde(default)]
    pub authenticated: bool,
    /// Claims asserted for the caller
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(claims: Vec<Claim>) -> Self {
        Self {
            authenticated: true,
            claims,
        }
    }

    /// Exact match on both claim type and value.
    pub fn has_claim(&self, kind: &str, value: &str) -> bool {
        self.claims.iter().any(|c| c.kind == kind && c.value == value)
    }

    /// Value of the first claim of the given type (type compared case-insensitively).
    pub fn find_first(&self, kind: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.kind.eq_ignore_ascii_case(kind))
            .map(|c| c.value.as_str())
    }

    /// Authenticated and carrying the `UserType = Parent` marker.
    pub fn is_trusted_context_holder(&self) -> bool {
        self.authenticated && self.has_claim(USER_TYPE_CLAIM, TRUSTED_USER_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_never_trusted() {
        let identity = Identity {
            authenticated: false,
            claims: vec![Claim::new(USER_TYPE_CLAIM, TRUSTED_USER_TYPE)],
        };
        assert!(!identity.is_trusted_context_holder());
        assert!(!Identity::anonymous().is_trusted_context_holder());
    }

    #[test]
    fn marker_value_must_match_exactly() {
        let identity = Identity::authenticated(vec![Claim::new(USER_TYPE_CLAIM, "parent")]);
        assert!(!identity.is_trusted_context_holder());

        let identity = Identity::authenticated(vec![Claim::new(USER_TYPE_CLAIM, "Parent")]);
        assert!(identity.is_trusted_context_holder());
    }

    #[test]
    fn find_first_returns_earliest_match() {
        let identity = Identity::authenticated(vec![
            Claim::new(PERSON_ID_CLAIM, "1"),
            Claim::new("personid", "2"),
        ]);
        assert_eq!(identity.find_first(PERSON_ID_CLAIM), Some("1"));
        assert_eq!(identity.find_first(HOUSEHOLD_ID_CLAIM), None);
    }
}

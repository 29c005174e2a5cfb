//! Errors raised while resolving or enforcing an ambient context.
//!
//! Only developer-facing failures live here. Malformed client state and
//! unsatisfied policies are handled without an error.

use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    /// A trusted claim carried a non-numeric id. Points at the identity
    /// issuer, not at the user.
    #[error("claim {claim} has non-numeric value {value:?}")]
    MalformedClaim {
        claim: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// A route named a policy that was never registered.
    #[error("Could not find ambient context policy named {0}")]
    UnknownPolicy(String),

    /// A policy name was registered twice.
    #[error("ambient context policy {0} is already registered")]
    DuplicatePolicy(String),
}

impl ContextError {
    /// Configuration errors are the ones startup validation can catch.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownPolicy(_) | Self::DuplicatePolicy(_))
    }
}

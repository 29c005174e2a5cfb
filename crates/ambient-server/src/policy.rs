//! Policy registry — named predicates over a resolved [`AmbientContext`].
//!
//! Built once at startup and read-only afterwards. The reserved
//! [`DEFAULT_POLICY`] entry is always present and requires a complete
//! context.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ambient_protocol::{AmbientContext, ContextError};
use serde::Serialize;
use tracing::info;

/// Name used when a route requirement does not name a policy.
pub const DEFAULT_POLICY: &str = "__DEFAULT__";

/// Either id present.
pub const PARTIAL_POLICY: &str = "Partial";

/// Person id present.
pub const PARENT_ID_REQUIRED_POLICY: &str = "ParentIdRequired";

/// Always satisfied; the handler still sees whatever was resolved.
pub const ALLOW_EMPTY_POLICY: &str = "AllowEmpty";

pub type PolicyPredicate = Arc<dyn Fn(&AmbientContext) -> bool + Send + Sync>;

/// A predicate deciding whether a route may proceed.
#[derive(Clone)]
pub enum Policy {
    /// Source present and both ids present.
    Complete,
    /// At least one id present.
    AnyPresent,
    /// Person id present.
    PersonRequired,
    /// Always proceeds, even with an empty context.
    AlwaysSatisfied,
    /// Application-supplied predicate, labelled for diagnostics.
    Custom {
        label: String,
        predicate: PolicyPredicate,
    },
}

impl Policy {
    pub fn custom<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&AmbientContext) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn evaluate(&self, context: &AmbientContext) -> bool {
        match self {
            Self::Complete => context.is_complete(),
            Self::AnyPresent => context.household_id().is_some() || context.person_id().is_some(),
            Self::PersonRequired => context.person_id().is_some(),
            Self::AlwaysSatisfied => true,
            Self::Custom { predicate, .. } => predicate(context),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Complete => "Complete",
            Self::AnyPresent => "AnyPresent",
            Self::PersonRequired => "PersonRequired",
            Self::AlwaysSatisfied => "AlwaysSatisfied",
            Self::Custom { label, .. } => label,
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { label, .. } => f.debug_struct("Custom").field("label", label).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Diagnostic view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDescriptor {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, Policy>,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRegistry {
    /// A registry holding only the default policy.
    pub fn new() -> Self {
        let mut policies = HashMap::new();
        policies.insert(DEFAULT_POLICY.to_string(), Policy::Complete);
        Self { policies }
    }

    /// Default plus `Partial`, `ParentIdRequired` and `AllowEmpty`.
    pub fn with_standard_policies() -> Self {
        let mut policies = Self::new().policies;
        policies.insert(PARTIAL_POLICY.to_string(), Policy::AnyPresent);
        policies.insert(PARENT_ID_REQUIRED_POLICY.to_string(), Policy::PersonRequired);
        policies.insert(ALLOW_EMPTY_POLICY.to_string(), Policy::AlwaysSatisfied);
        Self { policies }
    }

    /// Register a named policy. Names are unique, including the default.
    pub fn register(&mut self, name: impl Into<String>, policy: Policy) -> Result<(), ContextError> {
        let name = name.into();
        if self.policies.contains_key(&name) {
            return Err(ContextError::DuplicatePolicy(name));
        }
        info!("Registering ambient context policy: {} ({})", name, policy.kind());
        self.policies.insert(name, policy);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    /// Look up a policy. A missing name is a configuration error.
    pub fn get(&self, name: &str) -> Result<&Policy, ContextError> {
        self.policies
            .get(name)
            .ok_or_else(|| ContextError::UnknownPolicy(name.to_string()))
    }

    pub fn evaluate(&self, name: &str, context: &AmbientContext) -> Result<bool, ContextError> {
        Ok(self.get(name)?.evaluate(context))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Entries sorted by name.
    pub fn describe(&self) -> Vec<PolicyDescriptor> {
        let mut entries: Vec<_> = self
            .policies
            .iter()
            .map(|(name, policy)| PolicyDescriptor {
                name: name.clone(),
                kind: policy.kind().to_string(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

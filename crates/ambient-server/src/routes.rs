//! Route requirements — which routes need an ambient context, and under
//! which policy.

use std::collections::HashMap;

use ambient_protocol::ContextError;

use crate::policy::{DEFAULT_POLICY, PolicyRegistry};

/// Marker attached to a route at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    policy: Option<String>,
}

impl RouteRequirement {
    /// Require the default (complete context) policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: impl Into<String>) -> Self {
        Self {
            policy: Some(policy.into()),
        }
    }

    /// The explicitly named policy, if any.
    pub fn policy(&self) -> Option<&str> {
        self.policy.as_deref()
    }

    /// The policy to evaluate, falling back to [`DEFAULT_POLICY`].
    pub fn policy_name(&self) -> &str {
        self.policy.as_deref().unwrap_or(DEFAULT_POLICY)
    }
}

/// Route pattern → requirement. Routes absent from the table are unguarded.
#[derive(Debug, Clone, Default)]
pub struct RouteRequirements {
    routes: HashMap<String, RouteRequirement>,
}

impl RouteRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, route: impl Into<String>, requirement: RouteRequirement) {
        self.routes.insert(route.into(), requirement);
    }

    pub fn get(&self, route: &str) -> Option<&RouteRequirement> {
        self.routes.get(route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteRequirement)> {
        self.routes.iter().map(|(route, req)| (route.as_str(), req))
    }

    /// Check every requirement names a registered policy.
    pub fn validate(&self, policies: &PolicyRegistry) -> Result<(), ContextError> {
        let mut names: Vec<&str> = self.routes.values().map(|r| r.policy_name()).collect();
        names.sort_unstable();

        match names.into_iter().find(|name| !policies.contains(name)) {
            Some(missing) => Err(ContextError::UnknownPolicy(missing.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_requirement_uses_default() {
        let req = RouteRequirement::new();
        assert_eq!(req.policy(), None);
        assert_eq!(req.policy_name(), DEFAULT_POLICY);
        assert_eq!(RouteRequirement::with_policy("Partial").policy_name(), "Partial");
    }

    #[test]
    fn unregistered_route_is_unguarded() {
        let mut routes = RouteRequirements::new();
        routes.require("/Secure", RouteRequirement::new());
        assert!(routes.get("/Secure").is_some());
        assert!(routes.get("/").is_none());
    }

    #[test]
    fn validate_catches_unknown_policy() {
        let mut routes = RouteRequirements::new();
        routes.require("/a", RouteRequirement::new());
        routes.require("/b", RouteRequirement::with_policy("Partial"));
        assert!(routes.validate(&PolicyRegistry::with_standard_policies()).is_ok());

        routes.require("/c", RouteRequirement::with_policy("Typo"));
        let err = routes.validate(&PolicyRegistry::with_standard_policies()).unwrap_err();
        assert!(matches!(err, ContextError::UnknownPolicy(ref name) if name == "Typo"));
    }
}

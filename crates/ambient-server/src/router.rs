//! Ambient Router — registers routes alongside their context requirements
//! and wires the setup flow and middleware into one axum router.

use std::sync::Arc;

use ambient_protocol::ContextError;
use ambient_transport::{IdentityTable, attach_identity};
use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{MethodRouter, get, post},
};
use tracing::info;

use crate::middleware::{AmbientContextOptions, ContextEnforcer, enforce_ambient_context};
use crate::policy::PolicyRegistry;
use crate::routes::{RouteRequirement, RouteRequirements};
use crate::setup::{clear_setup, show_setup, submit_setup};

/// Builder pairing each route with its (optional) requirement.
#[derive(Default)]
pub struct AmbientRouter {
    router: Router,
    requirements: RouteRequirements,
}

impl AmbientRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route with no context requirement.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        info!("Registering route: {}", path);
        self.router = self.router.route(path, method_router);
        self
    }

    /// Register a route that only runs once `requirement` is satisfied.
    pub fn guarded_route(mut self, path: &str, requirement: RouteRequirement, method_router: MethodRouter) -> Self {
        info!("Registering guarded route: {} (policy: {})", path, requirement.policy_name());
        self.requirements.require(path, requirement);
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn requirements(&self) -> &RouteRequirements {
        &self.requirements
    }

    /// Validate requirements against `policies` and assemble the router.
    ///
    /// Layer order: identity attachment runs first, then enforcement.
    pub fn build(
        self,
        options: AmbientContextOptions,
        policies: PolicyRegistry,
        identities: IdentityTable,
    ) -> Result<Router, ContextError> {
        self.requirements.validate(&policies)?;

        let setup_path = options.setup_path.clone();
        let enforcer = Arc::new(ContextEnforcer::new(options, policies, self.requirements));

        let setup = Router::new()
            .route(&setup_path, get(show_setup).post(submit_setup))
            .route(&format!("{setup_path}/clear"), post(clear_setup))
            .route("/_ambient/policies", get(describe_policies))
            .with_state(enforcer.clone());

        Ok(self
            .router
            .merge(setup)
            .layer(from_fn_with_state(enforcer, enforce_ambient_context))
            .layer(from_fn_with_state(Arc::new(identities), attach_identity)))
    }
}

async fn describe_policies(State(enforcer): State<Arc<ContextEnforcer>>) -> impl IntoResponse {
    Json(enforcer.policies().describe())
}

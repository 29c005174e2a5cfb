//! Ambient Context Server — resolves, enforces and binds the per-request
//! household/person context.
//!
//! Request flow:
//!   identity attached → [`middleware`] asks the [`resolver`] for the
//!   context → the route's [`policy`] decides → the handler reads fields
//!   through the [`binder`], or the caller is sent to the [`setup`] flow.

pub mod binder;
pub mod middleware;
pub mod policy;
pub mod resolver;
pub mod router;
pub mod routes;
pub mod setup;

pub use binder::{CurrentContext, FieldSelector, FromAmbientContext, Hid, Pid, ResolvedContext};
pub use middleware::{AmbientContextOptions, ContextEnforcer, Enforcement};
pub use policy::{DEFAULT_POLICY, Policy, PolicyRegistry};
pub use resolver::ContextResolver;
pub use router::AmbientRouter;
pub use routes::{RouteRequirement, RouteRequirements};

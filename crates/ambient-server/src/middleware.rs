//! Enforcement middleware — guards routes that require an ambient context.
//!
//! Per request, in order:
//!   1. Setup path → bypass (the setup flow must stay reachable)
//!   2. Route without a requirement → proceed untouched
//!   3. Guarded route → resolve, evaluate the route's policy, then either
//!      attach the context and proceed, or redirect to the setup path

use std::sync::Arc;

use ambient_protocol::{AmbientContext, ContextError, Identity};
use ambient_transport::{BlobAttributes, ClientStateStore, CookieStateStore};
use axum::{
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, error, info};

use crate::binder::ResolvedContext;
use crate::policy::PolicyRegistry;
use crate::resolver::{ContextResolver, DEFAULT_STATE_KEY};
use crate::routes::RouteRequirements;

/// Everything but RFC 3986 unreserved characters is escaped.
const DATA_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ambient context configuration.
#[derive(Debug, Clone)]
pub struct AmbientContextOptions {
    /// Setup flow path; never guarded
    pub setup_path: String,
    /// Where the setup flow lands when no return path is usable
    pub home_path: String,
    /// Key of the client-held state blob
    pub state_key: String,
    /// Attributes applied when the blob is written
    pub attributes: BlobAttributes,
}

impl Default for AmbientContextOptions {
    fn default() -> Self {
        Self {
            setup_path: "/SetupContext".into(),
            home_path: "/".into(),
            state_key: DEFAULT_STATE_KEY.into(),
            attributes: BlobAttributes::default(),
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    /// Request targets the setup flow.
    Bypass,
    /// Route declares no requirement.
    Unguarded,
    /// Policy satisfied; the context is attached for the handler.
    Proceed(AmbientContext),
    /// Policy unsatisfied; send the caller to the setup flow.
    Redirect { location: String },
}

/// Process-wide enforcement state. Read-only once built.
#[derive(Debug)]
pub struct ContextEnforcer {
    options: AmbientContextOptions,
    resolver: ContextResolver,
    policies: PolicyRegistry,
    routes: RouteRequirements,
}

impl ContextEnforcer {
    pub fn new(options: AmbientContextOptions, policies: PolicyRegistry, routes: RouteRequirements) -> Self {
        let resolver = ContextResolver::new(options.state_key.clone(), options.attributes.clone());
        info!(
            "Ambient context enforcement: {} guarded routes, {} policies, setup at {}",
            routes.len(),
            policies.len(),
            options.setup_path
        );
        Self {
            options,
            resolver,
            policies,
            routes,
        }
    }

    pub fn options(&self) -> &AmbientContextOptions {
        &self.options
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn routes(&self) -> &RouteRequirements {
        &self.routes
    }

    /// Case-insensitive segment-prefix match against the setup path.
    pub fn is_setup_path(&self, path: &str) -> bool {
        starts_with_segments(path, &self.options.setup_path)
    }

    /// `<setup>?returnUrl=<escaped path>`
    pub fn setup_redirect(&self, path: &str) -> String {
        format!(
            "{}?returnUrl={}",
            self.options.setup_path,
            utf8_percent_encode(path, DATA_ESCAPE)
        )
    }

    /// Decide what happens to a request for `path`, matched as `route`.
    pub fn evaluate<S>(
        &self,
        path: &str,
        route: &str,
        identity: &Identity,
        store: &S,
    ) -> Result<Enforcement, ContextError>
    where
        S: ClientStateStore + ?Sized,
    {
        if self.is_setup_path(path) {
            return Ok(Enforcement::Bypass);
        }

        let Some(requirement) = self.routes.get(route) else {
            return Ok(Enforcement::Unguarded);
        };

        let context = self.resolver.resolve(identity, store)?;
        let policy = requirement.policy_name();

        if self.policies.evaluate(policy, &context)? {
            debug!(route, policy, ?context, "Ambient context policy satisfied");
            Ok(Enforcement::Proceed(context))
        } else {
            debug!(route, policy, ?context, "Ambient context policy unsatisfied, redirecting");
            Ok(Enforcement::Redirect {
                location: self.setup_redirect(path),
            })
        }
    }
}

fn starts_with_segments(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => {
            matches!(path.as_bytes().get(prefix.len()), None | Some(b'/'))
        }
        _ => false,
    }
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Fatal resolution or configuration error surfaced as a server error.
#[derive(Debug)]
pub struct EnforcementFailure(pub ContextError);

impl IntoResponse for EnforcementFailure {
    fn into_response(self) -> Response {
        error!("Ambient context failure: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Ambient context could not be resolved").into_response()
    }
}

/// Axum middleware applying [`ContextEnforcer::evaluate`] to every request.
pub async fn enforce_ambient_context(
    State(enforcer): State<Arc<ContextEnforcer>>,
    mut req: Request,
    next: Next,
) -> Response {
    let decision = {
        let path = req.uri().path();
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|m| m.as_str())
            .unwrap_or(path);
        let anonymous = Identity::anonymous();
        let identity = req.extensions().get::<Identity>().unwrap_or(&anonymous);
        let store = CookieStateStore::from_headers(req.headers());

        enforcer.evaluate(path, route, identity, &store)
    };

    match decision {
        Ok(Enforcement::Bypass | Enforcement::Unguarded) => next.run(req).await,
        Ok(Enforcement::Proceed(context)) => {
            req.extensions_mut().insert(ResolvedContext(context));
            next.run(req).await
        }
        Ok(Enforcement::Redirect { location }) => found(&location),
        Err(e) => EnforcementFailure(e).into_response(),
    }
}

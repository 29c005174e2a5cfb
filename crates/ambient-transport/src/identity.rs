//! Identity attachment — maps bearer tokens to verified claim sets.
//!
//! Stands in for the host's authentication subsystem: every request gets
//! an [`Identity`] extension before any ambient context logic runs.
//! Requests without a recognized token are anonymous.

use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use ambient_protocol::Identity;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::TransportError;

/// Table of bearer token → identity, loaded once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct IdentityTable {
    tokens: HashMap<String, Identity>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }

    pub fn from_json(json: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON table of the form `{ "<token>": { "authenticated": .., "claims": [..] } }`.
    pub fn load(path: &Path) -> Result<Self, TransportError> {
        let json = std::fs::read_to_string(path).map_err(|source| TransportError::ReadIdentities {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Identity for the request's `Authorization: Bearer` token.
    pub fn identify(&self, headers: &HeaderMap) -> Identity {
        let Some(token) = bearer_token(headers) else {
            return Identity::anonymous();
        };

        match self.tokens.get(token) {
            Some(identity) => identity.clone(),
            None => {
                warn!("Unknown bearer token, treating caller as anonymous");
                Identity::anonymous()
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that attaches the caller's [`Identity`] to the request.
pub async fn attach_identity(
    State(table): State<Arc<IdentityTable>>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = table.identify(req.headers());
    debug!(
        authenticated = identity.authenticated,
        claims = identity.claims.len(),
        "Identity attached"
    );
    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Extractor for the attached identity. Anonymous if none was attached.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned().unwrap_or_default()))
    }
}

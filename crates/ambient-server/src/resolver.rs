//! Context resolver — decides which source supplies the ambient context
//! and reads/writes it.
//!
//! Callers carrying `UserType = Parent` get their context from claims;
//! everyone else gets it from the client-held state blob.

use ambient_protocol::claims::{HOUSEHOLD_ID_CLAIM, PERSON_ID_CLAIM};
use ambient_protocol::{AmbientContext, ContextError, Identity, state};
use ambient_transport::{BlobAttributes, ClientStateStore};
use tracing::{debug, warn};

/// Key of the client-held state blob.
pub const DEFAULT_STATE_KEY: &str = "AmbientContext";

#[derive(Debug, Clone)]
pub struct ContextResolver {
    state_key: String,
    attributes: BlobAttributes,
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_KEY, BlobAttributes::default())
    }
}

impl ContextResolver {
    pub fn new(state_key: impl Into<String>, attributes: BlobAttributes) -> Self {
        Self {
            state_key: state_key.into(),
            attributes,
        }
    }

    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    pub fn attributes(&self) -> &BlobAttributes {
        &self.attributes
    }

    /// Resolve the caller's context.
    ///
    /// A non-numeric id claim is an error. A malformed blob is not: it
    /// resolves to [`AmbientContext::empty`].
    pub fn resolve<S>(&self, identity: &Identity, store: &S) -> Result<AmbientContext, ContextError>
    where
        S: ClientStateStore + ?Sized,
    {
        if identity.is_trusted_context_holder() {
            let context = AmbientContext::from_claims(
                parse_claim(identity, HOUSEHOLD_ID_CLAIM)?,
                parse_claim(identity, PERSON_ID_CLAIM)?,
            );
            debug!(hid = ?context.household_id(), pid = ?context.person_id(), "Context resolved from claims");
            return Ok(context);
        }

        Ok(self.resolve_persisted(store))
    }

    fn resolve_persisted<S>(&self, store: &S) -> AmbientContext
    where
        S: ClientStateStore + ?Sized,
    {
        let Some(raw) = store.get(&self.state_key) else {
            return AmbientContext::empty();
        };

        match state::decode(&raw) {
            Some(ids) => {
                let context = ids.into_context();
                debug!(hid = ?context.household_id(), pid = ?context.person_id(), "Context resolved from client state");
                context
            }
            None => {
                warn!(key = %self.state_key, "Ignoring malformed client context state");
                AmbientContext::empty()
            }
        }
    }

    /// Persist the present ids of `context` for callers without trusted
    /// claims. Claim-backed callers are left untouched.
    pub fn set_context<S>(&self, identity: &Identity, store: &mut S, context: &AmbientContext)
    where
        S: ClientStateStore + ?Sized,
    {
        if identity.is_trusted_context_holder() {
            debug!("Context comes from claims, not persisting");
            return;
        }

        store.set(&self.state_key, state::encode(context), &self.attributes);
        debug!(hid = ?context.household_id(), pid = ?context.person_id(), "Context persisted");
    }

    /// Delete the persisted blob. No-op for claim-backed callers.
    pub fn clear_context<S>(&self, identity: &Identity, store: &mut S)
    where
        S: ClientStateStore + ?Sized,
    {
        if identity.is_trusted_context_holder() {
            return;
        }

        store.delete(&self.state_key, &self.attributes);
        debug!("Context cleared");
    }

    pub fn has_complete_context<S>(&self, identity: &Identity, store: &S) -> Result<bool, ContextError>
    where
        S: ClientStateStore + ?Sized,
    {
        Ok(self.resolve(identity, store)?.is_complete())
    }
}

fn parse_claim(identity: &Identity, claim: &'static str) -> Result<Option<i32>, ContextError> {
    identity
        .find_first(claim)
        .map(|value| {
            value.trim().parse::<i32>().map_err(|source| ContextError::MalformedClaim {
                claim,
                value: value.to_string(),
                source,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use ambient_protocol::Claim;
    use ambient_protocol::ContextSource;
    use ambient_protocol::claims::{TRUSTED_USER_TYPE, USER_TYPE_CLAIM};
    use ambient_transport::MemoryStateStore;

    use super::*;

    fn parent(claims: &[(&str, &str)]) -> Identity {
        let mut all = vec![Claim::new(USER_TYPE_CLAIM, TRUSTED_USER_TYPE)];
        all.extend(claims.iter().map(|(k, v)| Claim::new(*k, *v)));
        Identity::authenticated(all)
    }

    fn store_with(raw: &str) -> MemoryStateStore {
        MemoryStateStore::new().with_value(DEFAULT_STATE_KEY, raw)
    }

    #[test]
    fn parent_claims_are_the_source() {
        let identity = parent(&[(HOUSEHOLD_ID_CLAIM, "31412"), (PERSON_ID_CLAIM, "123456")]);
        let ctx = ContextResolver::default()
            .resolve(&identity, &store_with(r#"{"hid":1,"pid":2}"#))
            .unwrap();

        assert_eq!(ctx, AmbientContext::from_claims(Some(31412), Some(123456)));
        assert!(ctx.is_complete());
    }

    #[test]
    fn missing_claims_resolve_to_absent_ids() {
        let identity = parent(&[(PERSON_ID_CLAIM, "7")]);
        let ctx = ContextResolver::default()
            .resolve(&identity, &MemoryStateStore::new())
            .unwrap();

        assert_eq!(ctx.source(), ContextSource::TrustedClaims);
        assert_eq!(ctx.household_id(), None);
        assert_eq!(ctx.person_id(), Some(7));
    }

    #[test]
    fn malformed_claim_is_an_error() {
        let identity = parent(&[(HOUSEHOLD_ID_CLAIM, "abc")]);
        let err = ContextResolver::default()
            .resolve(&identity, &MemoryStateStore::new())
            .unwrap_err();

        assert!(matches!(
            err,
            ContextError::MalformedClaim { claim: HOUSEHOLD_ID_CLAIM, .. }
        ));
    }

    #[test]
    fn unauthenticated_parent_marker_falls_back_to_state() {
        let identity = Identity {
            authenticated: false,
            claims: vec![Claim::new(USER_TYPE_CLAIM, TRUSTED_USER_TYPE)],
        };
        let ctx = ContextResolver::default()
            .resolve(&identity, &store_with(r#"{"hid":3}"#))
            .unwrap();

        assert_eq!(ctx, AmbientContext::from_persisted(Some(3), None));
    }

    #[test]
    fn no_blob_resolves_empty() {
        let ctx = ContextResolver::default()
            .resolve(&Identity::anonymous(), &MemoryStateStore::new())
            .unwrap();
        assert_eq!(ctx, AmbientContext::empty());
    }

    #[test]
    fn malformed_blob_resolves_empty() {
        let resolver = ContextResolver::default();
        for raw in ["garbage", "{", r#"{"hid":"x"}"#, "null", "[1,2]"] {
            let ctx = resolver.resolve(&Identity::anonymous(), &store_with(raw)).unwrap();
            assert_eq!(ctx, AmbientContext::empty(), "blob {raw:?}");
        }
    }

    #[test]
    fn partial_blob_keeps_present_id() {
        let ctx = ContextResolver::default()
            .resolve(&Identity::anonymous(), &store_with(r#"{"pid":123}"#))
            .unwrap();
        assert_eq!(ctx, AmbientContext::from_persisted(None, Some(123)));
    }

    #[test]
    fn set_then_resolve_round_trips_present_ids() {
        let resolver = ContextResolver::default();
        let anonymous = Identity::anonymous();

        for (hid, pid) in [(Some(1), Some(2)), (Some(5), None), (None, Some(9)), (None, None)] {
            let mut store = MemoryStateStore::new();
            resolver.set_context(&anonymous, &mut store, &AmbientContext::from_persisted(hid, pid));

            let ctx = resolver.resolve(&anonymous, &store).unwrap();
            assert_eq!(ctx.source(), ContextSource::PersistedState);
            assert_eq!(ctx.household_id(), hid);
            assert_eq!(ctx.person_id(), pid);
        }
    }

    #[test]
    fn set_omits_absent_ids_and_applies_attributes() {
        let resolver = ContextResolver::default();
        let mut store = MemoryStateStore::new();
        resolver.set_context(
            &Identity::anonymous(),
            &mut store,
            &AmbientContext::from_persisted(None, Some(4)),
        );

        assert_eq!(store.get(DEFAULT_STATE_KEY).as_deref(), Some(r#"{"pid":4}"#));
        assert_eq!(store.attributes(DEFAULT_STATE_KEY), Some(&BlobAttributes::default()));
    }

    #[test]
    fn trusted_caller_writes_nothing() {
        let resolver = ContextResolver::default();
        let identity = parent(&[]);
        let mut store = store_with(r#"{"hid":1}"#);

        resolver.set_context(&identity, &mut store, &AmbientContext::from_persisted(Some(8), Some(9)));
        resolver.clear_context(&identity, &mut store);

        assert_eq!(store.mutations(), 0);
        assert_eq!(store.get(DEFAULT_STATE_KEY).as_deref(), Some(r#"{"hid":1}"#));
    }

    #[test]
    fn clear_deletes_blob() {
        let resolver = ContextResolver::default();
        let mut store = store_with(r#"{"hid":1,"pid":2}"#);

        resolver.clear_context(&Identity::anonymous(), &mut store);
        assert_eq!(store.get(DEFAULT_STATE_KEY), None);
        assert_eq!(
            resolver.resolve(&Identity::anonymous(), &store).unwrap(),
            AmbientContext::empty()
        );
    }

    #[test]
    fn has_complete_context_follows_resolution() {
        let resolver = ContextResolver::default();
        assert!(resolver
            .has_complete_context(&Identity::anonymous(), &store_with(r#"{"hid":1,"pid":2}"#))
            .unwrap());
        assert!(!resolver
            .has_complete_context(&Identity::anonymous(), &store_with(r#"{"hid":1}"#))
            .unwrap());
    }
}

//! Field binder — hands single context fields to handlers.
//!
//! Reads the [`ResolvedContext`] attached by the enforcement middleware.
//! Binding yields no value when nothing was attached, the name is not a
//! context field, or the field itself is absent. None of these are errors.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use ambient_protocol::{AmbientContext, ContextField};
use axum::{extract::FromRequestParts, http::request::Parts};

/// The context attached to a request after its policy was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedContext(pub AmbientContext);

/// Value of `field`, if a context was attached and the field is present.
pub fn bind(resolved: Option<&ResolvedContext>, field: ContextField) -> Option<i32> {
    resolved?.0.get(field)
}

/// Like [`bind`], selecting the field by its binding name (`hid` / `pid`,
/// any case). Unknown names bind nothing.
pub fn bind_by_name(resolved: Option<&ResolvedContext>, name: &str) -> Option<i32> {
    let field = name.parse::<ContextField>().ok()?;
    bind(resolved, field)
}

/// Compile-time field selector for [`FromAmbientContext`].
pub trait FieldSelector: Send + Sync + 'static {
    const FIELD: ContextField;
}

/// Selects the household id.
#[derive(Debug, Clone, Copy)]
pub struct Hid;

/// Selects the person id.
#[derive(Debug, Clone, Copy)]
pub struct Pid;

impl FieldSelector for Hid {
    const FIELD: ContextField = ContextField::HouseholdId;
}

impl FieldSelector for Pid {
    const FIELD: ContextField = ContextField::PersonId;
}

/// Extractor populating a handler argument from one context field.
///
/// ```ignore
/// async fn page(pid: FromAmbientContext<Pid>, hid: FromAmbientContext<Hid>) -> String {
///     format!("{:?} {:?}", pid.value(), hid.value())
/// }
/// ```
pub struct FromAmbientContext<F: FieldSelector> {
    value: Option<i32>,
    _field: PhantomData<F>,
}

impl<F: FieldSelector> FromAmbientContext<F> {
    pub fn value(&self) -> Option<i32> {
        self.value
    }

    pub fn into_inner(self) -> Option<i32> {
        self.value
    }
}

impl<F: FieldSelector> fmt::Debug for FromAmbientContext<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromAmbientContext")
            .field("field", &F::FIELD)
            .field("value", &self.value)
            .finish()
    }
}

impl<S: Send + Sync, F: FieldSelector> FromRequestParts<S> for FromAmbientContext<F> {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            value: bind(parts.extensions.get::<ResolvedContext>(), F::FIELD),
            _field: PhantomData,
        })
    }
}

/// Extractor for the whole attached context, if any.
#[derive(Debug, Clone, Copy)]
pub struct CurrentContext(pub Option<AmbientContext>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<ResolvedContext>().map(|r| r.0)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn resolved(hid: Option<i32>, pid: Option<i32>) -> ResolvedContext {
        ResolvedContext(AmbientContext::from_persisted(hid, pid))
    }

    #[test]
    fn binds_present_fields() {
        let ctx = resolved(Some(31412), Some(123456));
        assert_eq!(bind(Some(&ctx), ContextField::HouseholdId), Some(31412));
        assert_eq!(bind(Some(&ctx), ContextField::PersonId), Some(123456));
    }

    #[test]
    fn names_match_case_insensitively() {
        let ctx = resolved(Some(1), Some(2));
        assert_eq!(bind_by_name(Some(&ctx), "Hid"), Some(1));
        assert_eq!(bind_by_name(Some(&ctx), "PID"), Some(2));
    }

    #[test]
    fn unbound_cases_yield_nothing() {
        let ctx = resolved(None, Some(2));
        assert_eq!(bind(None, ContextField::PersonId), None);
        assert_eq!(bind_by_name(Some(&ctx), "email"), None);
        assert_eq!(bind_by_name(Some(&ctx), "hid"), None);
    }

    #[tokio::test]
    async fn extractor_reads_attached_context() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(resolved(Some(7), None));

        let hid = FromAmbientContext::<Hid>::from_request_parts(&mut parts, &()).await.unwrap();
        let pid = FromAmbientContext::<Pid>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(hid.value(), Some(7));
        assert_eq!(pid.value(), None);
    }

    #[tokio::test]
    async fn extractor_without_context_is_unset() {
        let (mut parts, _) = Request::new(()).into_parts();

        let pid = FromAmbientContext::<Pid>::from_request_parts(&mut parts, &()).await.unwrap();
        let current = CurrentContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(pid.into_inner(), None);
        assert_eq!(current.0, None);
    }
}

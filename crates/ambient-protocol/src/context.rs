//! The resolved ambient context: a household id and a person id plus
//! where they came from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Provenance of a resolved [`AmbientContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextSource {
    /// Nothing was resolved.
    None,
    /// Read from the verified claim set of an authenticated caller.
    TrustedClaims,
    /// Read from the client-held state blob.
    PersistedState,
}

/// Immutable household/person pair associated with a request.
///
/// A context whose source is [`ContextSource::None`] never carries ids;
/// that value is [`AmbientContext::empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AmbientContext {
    source: ContextSource,
    #[serde(rename = "hid")]
    household_id: Option<i32>,
    #[serde(rename = "pid")]
    person_id: Option<i32>,
}

impl AmbientContext {
    /// The canonical context with no source and no ids.
    pub const fn empty() -> Self {
        Self {
            source: ContextSource::None,
            household_id: None,
            person_id: None,
        }
    }

    pub const fn from_claims(household_id: Option<i32>, person_id: Option<i32>) -> Self {
        Self {
            source: ContextSource::TrustedClaims,
            household_id,
            person_id,
        }
    }

    pub const fn from_persisted(household_id: Option<i32>, person_id: Option<i32>) -> Self {
        Self {
            source: ContextSource::PersistedState,
            household_id,
            person_id,
        }
    }

    pub fn source(&self) -> ContextSource {
        self.source
    }

    pub fn household_id(&self) -> Option<i32> {
        self.household_id
    }

    pub fn person_id(&self) -> Option<i32> {
        self.person_id
    }

    /// Read one field by selector.
    pub fn get(&self, field: ContextField) -> Option<i32> {
        match field {
            ContextField::HouseholdId => self.household_id,
            ContextField::PersonId => self.person_id,
        }
    }

    /// True iff the context has a source and both ids are present.
    pub fn is_complete(&self) -> bool {
        self.source != ContextSource::None
            && self.household_id.is_some()
            && self.person_id.is_some()
    }

    /// Non-destructive partial update: each id is replaced only when a
    /// replacement is supplied.
    ///
    /// Supplying an id to the empty context yields a
    /// [`ContextSource::PersistedState`] context.
    pub fn with(&self, household_id: Option<i32>, person_id: Option<i32>) -> Self {
        let household_id = household_id.or(self.household_id);
        let person_id = person_id.or(self.person_id);

        let source = match self.source {
            ContextSource::None if household_id.is_some() || person_id.is_some() => {
                ContextSource::PersistedState
            }
            source => source,
        };

        Self {
            source,
            household_id,
            person_id,
        }
    }
}

impl Default for AmbientContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Selector for a single context field, as bound into handler values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextField {
    #[serde(rename = "hid")]
    HouseholdId,
    #[serde(rename = "pid")]
    PersonId,
}

impl ContextField {
    pub const ALL: [ContextField; 2] = [ContextField::HouseholdId, ContextField::PersonId];

    /// Short name used in the persisted blob and in binding declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HouseholdId => "hid",
            Self::PersonId => "pid",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a binding name matches no context field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ambient context field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for ContextField {
    type Err = UnknownField;

    /// Case-insensitive match against `hid` / `pid`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_source_and_no_ids() {
        let ctx = AmbientContext::empty();
        assert_eq!(ctx.source(), ContextSource::None);
        assert_eq!(ctx.household_id(), None);
        assert_eq!(ctx.person_id(), None);
        assert!(!ctx.is_complete());
        assert_eq!(ctx, AmbientContext::default());
    }

    #[test]
    fn complete_requires_source_and_both_ids() {
        assert!(AmbientContext::from_claims(Some(31412), Some(123456)).is_complete());
        assert!(AmbientContext::from_persisted(Some(1), Some(2)).is_complete());
        assert!(!AmbientContext::from_persisted(Some(31412), None).is_complete());
        assert!(!AmbientContext::from_claims(None, Some(1)).is_complete());
    }

    #[test]
    fn with_replaces_only_supplied_ids() {
        let ctx = AmbientContext::from_persisted(Some(1), Some(2));
        let updated = ctx.with(Some(5), None);
        assert_eq!(updated.household_id(), Some(5));
        assert_eq!(updated.person_id(), Some(2));
        assert_eq!(updated.source(), ContextSource::PersistedState);
    }

    #[test]
    fn with_nothing_is_an_unchanged_copy() {
        let ctx = AmbientContext::from_claims(Some(1), None);
        assert_eq!(ctx.with(None, None), ctx);
        assert_eq!(AmbientContext::empty().with(None, None), AmbientContext::empty());
    }

    #[test]
    fn with_on_empty_promotes_to_persisted() {
        let ctx = AmbientContext::empty().with(None, Some(9));
        assert_eq!(ctx.source(), ContextSource::PersistedState);
        assert_eq!(ctx.household_id(), None);
        assert_eq!(ctx.person_id(), Some(9));
    }

    #[test]
    fn field_names_are_case_insensitive() {
        assert_eq!("hid".parse::<ContextField>(), Ok(ContextField::HouseholdId));
        assert_eq!("Hid".parse::<ContextField>(), Ok(ContextField::HouseholdId));
        assert_eq!("PID".parse::<ContextField>(), Ok(ContextField::PersonId));
        assert!("household".parse::<ContextField>().is_err());
    }

    #[test]
    fn get_reads_selected_field() {
        let ctx = AmbientContext::from_claims(Some(7), Some(8));
        assert_eq!(ctx.get(ContextField::HouseholdId), Some(7));
        assert_eq!(ctx.get(ContextField::PersonId), Some(8));
    }
}

//! Encoding of the client-held state blob.
//!
//! The blob is a flat JSON object of string keys to integers, e.g.
//! `{"hid":31412,"pid":123456}`. Missing keys mean absent ids; explicit
//! nulls are never written.

use std::collections::{BTreeMap, HashMap};

use crate::context::{AmbientContext, ContextField};

/// Ids read back from a decoded blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistedIds {
    pub household_id: Option<i32>,
    pub person_id: Option<i32>,
}

impl PersistedIds {
    pub fn into_context(self) -> AmbientContext {
        AmbientContext::from_persisted(self.household_id, self.person_id)
    }
}

/// Serialize the present ids of `context`. Absent ids are omitted.
pub fn encode(context: &AmbientContext) -> String {
    let values: BTreeMap<&str, i32> = ContextField::ALL
        .into_iter()
        .filter_map(|field| context.get(field).map(|v| (field.as_str(), v)))
        .collect();

    // A map of &str to i32 always serializes.
    serde_json::to_string(&values).unwrap_or_else(|_| "{}".to_string())
}

/// Decode a blob. Any malformation (not JSON, not an object, a
/// non-integer value) yields `None`; unknown keys are ignored.
pub fn decode(raw: &str) -> Option<PersistedIds> {
    let values: HashMap<String, i32> = serde_json::from_str(raw).ok()?;

    Some(PersistedIds {
        household_id: values.get(ContextField::HouseholdId.as_str()).copied(),
        person_id: values.get(ContextField::PersonId.as_str()).copied(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_omits_absent_ids() {
        assert_eq!(encode(&AmbientContext::from_persisted(Some(1), None)), r#"{"hid":1}"#);
        assert_eq!(encode(&AmbientContext::from_persisted(None, Some(2))), r#"{"pid":2}"#);
        assert_eq!(encode(&AmbientContext::empty()), "{}");
    }

    #[test]
    fn decode_reads_keys_independently() {
        let ids = decode(r#"{"pid":123}"#).unwrap();
        assert_eq!(ids.household_id, None);
        assert_eq!(ids.person_id, Some(123));

        let ids = decode(r#"{"hid":5,"pid":6,"other":7}"#).unwrap();
        assert_eq!(ids.household_id, Some(5));
        assert_eq!(ids.person_id, Some(6));
    }

    #[test]
    fn decode_rejects_malformed_blobs() {
        for raw in ["", "not json", "null", "[]", r#"{"hid":"5"}"#, r#"{"hid":1.5}"#, r#"{"pid":null}"#] {
            assert_eq!(decode(raw), None, "expected rejection of {raw:?}");
        }
    }
}

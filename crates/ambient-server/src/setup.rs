//! Setup flow — lets callers without trusted claims choose their context.
//!
//! `GET <setup>` shows the current ids, `POST <setup>` stores new ones and
//! returns to the page that redirected here, `POST <setup>/clear` forgets
//! them.

use std::sync::Arc;

use ambient_protocol::{AmbientContext, ContextSource};
use ambient_transport::{CallerIdentity, CookieStateStore};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::middleware::{ContextEnforcer, EnforcementFailure, found};

#[derive(Debug, Deserialize)]
pub struct SetupQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Submitted form. Blank ids mean "no value".
#[derive(Debug, Deserialize)]
pub struct SetupForm {
    #[serde(default)]
    pub hid: Option<String>,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(rename = "returnUrl", default)]
    pub return_url: Option<String>,
}

/// Pre-populated form state.
#[derive(Debug, Serialize)]
pub struct SetupView {
    pub source: ContextSource,
    pub hid: Option<i32>,
    pub pid: Option<i32>,
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

pub async fn show_setup(
    State(enforcer): State<Arc<ContextEnforcer>>,
    CallerIdentity(identity): CallerIdentity,
    jar: CookieJar,
    Query(query): Query<SetupQuery>,
) -> Response {
    let store = CookieStateStore::new(jar);
    match enforcer.resolver().resolve(&identity, &store) {
        Ok(context) => Json(SetupView {
            source: context.source(),
            hid: context.household_id(),
            pid: context.person_id(),
            return_url: query.return_url,
        })
        .into_response(),
        Err(e) => EnforcementFailure(e).into_response(),
    }
}

pub async fn submit_setup(
    State(enforcer): State<Arc<ContextEnforcer>>,
    CallerIdentity(identity): CallerIdentity,
    jar: CookieJar,
    Form(form): Form<SetupForm>,
) -> Response {
    let (Ok(hid), Ok(pid)) = (parse_id(form.hid.as_deref()), parse_id(form.pid.as_deref())) else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "hid and pid must be integers").into_response();
    };

    let mut store = CookieStateStore::new(jar);
    enforcer
        .resolver()
        .set_context(&identity, &mut store, &AmbientContext::from_persisted(hid, pid));

    let return_to = return_target(form.return_url.as_deref(), &enforcer.options().home_path);
    debug!(return_to, "Context setup submitted");
    (store.into_jar(), found(return_to)).into_response()
}

pub async fn clear_setup(
    State(enforcer): State<Arc<ContextEnforcer>>,
    CallerIdentity(identity): CallerIdentity,
    jar: CookieJar,
) -> Response {
    let mut store = CookieStateStore::new(jar);
    enforcer.resolver().clear_context(&identity, &mut store);
    (store.into_jar(), found(&enforcer.options().home_path)).into_response()
}

fn parse_id(raw: Option<&str>) -> Result<Option<i32>, std::num::ParseIntError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

/// Only local absolute paths are followed; anything else lands on `home`.
fn return_target<'a>(return_url: Option<&'a str>, home: &'a str) -> &'a str {
    match return_url {
        Some(url) if is_local_path(url) => url,
        _ => home,
    }
}

/// A single leading `/` with no backslash or control character anywhere.
/// Browsers drop tabs and newlines while parsing, so `/\t/host` would
/// otherwise become `//host`.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && !url.chars().any(|c| c == '\\' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_absent() {
        assert_eq!(parse_id(None), Ok(None));
        assert_eq!(parse_id(Some("")), Ok(None));
        assert_eq!(parse_id(Some("  ")), Ok(None));
        assert_eq!(parse_id(Some(" 42 ")), Ok(Some(42)));
        assert!(parse_id(Some("4x")).is_err());
    }

    #[test]
    fn only_local_return_paths_are_followed() {
        assert_eq!(return_target(Some("/Secure"), "/"), "/Secure");
        assert_eq!(return_target(Some("https://evil.example"), "/"), "/");
        assert_eq!(return_target(Some("//evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/\\evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/\t/evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/\n/evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/\r/evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/a/\\/evil.example"), "/"), "/");
        assert_eq!(return_target(Some("/Secure?tab=1"), "/"), "/Secure?tab=1");
        assert_eq!(return_target(None, "/home"), "/home");
    }
}

//! Client-held state store — a named opaque blob round-tripped through
//! the caller between requests.

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Attributes applied whenever a blob is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobAttributes {
    /// Hidden from page scripts
    pub http_only: bool,
    /// Only sent over secure channels
    pub secure: bool,
    /// Cross-site sharing policy
    pub same_site: SameSite,
    /// Path scope
    pub path: String,
    /// Lifetime of the blob on the client
    pub max_age: Duration,
}

impl Default for BlobAttributes {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".into(),
            max_age: Duration::days(7),
        }
    }
}

/// Generic get/set/delete over named client-held blobs.
///
/// One store instance belongs to one request; it is never shared.
pub trait ClientStateStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String, attributes: &BlobAttributes);

    fn delete(&mut self, key: &str, attributes: &BlobAttributes);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cookie-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// Store backed by request cookies. Writes accumulate in the jar and are
/// emitted as `Set-Cookie` headers when the jar is returned in a response.
#[derive(Debug, Clone, Default)]
pub struct CookieStateStore {
    jar: CookieJar,
}

impl CookieStateStore {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(CookieJar::from_headers(headers))
    }

    /// Hand the jar back so it can be returned as part of a response.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl ClientStateStore for CookieStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|c| c.value().to_string())
    }

    fn set(&mut self, key: &str, value: String, attributes: &BlobAttributes) {
        let cookie = Cookie::build((key.to_string(), value))
            .http_only(attributes.http_only)
            .secure(attributes.secure)
            .same_site(attributes.same_site)
            .path(attributes.path.clone())
            .max_age(attributes.max_age);

        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn delete(&mut self, key: &str, attributes: &BlobAttributes) {
        let removal = Cookie::build((key.to_string(), String::new())).path(attributes.path.clone());
        self.jar = std::mem::take(&mut self.jar).remove(removal);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Store kept in process memory. Records write attributes and counts
/// mutations so callers can assert on what was (or was not) written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    values: HashMap<String, String>,
    attributes: HashMap<String, BlobAttributes>,
    mutations: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without counting it as a mutation.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Attributes used by the most recent write of `key`.
    pub fn attributes(&self, key: &str) -> Option<&BlobAttributes> {
        self.attributes.get(key)
    }

    /// Number of set/delete calls seen.
    pub fn mutations(&self) -> usize {
        self.mutations
    }
}

impl ClientStateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String, attributes: &BlobAttributes) {
        self.mutations += 1;
        self.values.insert(key.to_string(), value);
        self.attributes.insert(key.to_string(), attributes.clone());
    }

    fn delete(&mut self, key: &str, _attributes: &BlobAttributes) {
        self.mutations += 1;
        self.values.remove(key);
        self.attributes.remove(key);
    }
}

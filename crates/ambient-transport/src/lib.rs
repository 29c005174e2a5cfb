//! Ambient Context Transport Layer
//!
//! HTTP plumbing the ambient context pipeline runs on:
//! - Client-held state store (cookie-backed in production, in-memory for tests)
//! - Identity attachment from bearer tokens
//! - Server lifecycle (bind, serve, graceful stop)
//!
//! Nothing here knows about policies; the server crate builds on these pieces.

pub mod client_state;
pub mod error;
pub mod identity;
pub mod server;

pub use client_state::{BlobAttributes, ClientStateStore, CookieStateStore, MemoryStateStore};
pub use error::TransportError;
pub use identity::{CallerIdentity, IdentityTable, attach_identity};
pub use server::{TransportConfig, TransportServer};

//! Ambient Context - Protocol Types
//!
//! Value types shared by every layer of the ambient context pipeline:
//! the resolved context itself, the identity claim set it may be read
//! from, the compact encoding of the client-held state blob, and the
//! error taxonomy.

pub mod claims;
pub mod context;
pub mod error;
pub mod state;

pub use claims::{Claim, Identity};
pub use context::{AmbientContext, ContextField, ContextSource};
pub use error::ContextError;
pub use state::PersistedIds;

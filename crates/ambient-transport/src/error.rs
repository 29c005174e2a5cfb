//! Transport-level errors: startup and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("failed to read identity table {}: {source}", path.display())]
    ReadIdentities {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid identity table: {0}")]
    ParseIdentities(#[from] serde_json::Error),
}

//! Error types used throughout the gateway

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for document sync operations
///
/// The first six variants map one-to-one onto the gateway operations that
/// fail loudly. The remaining variants cover ambient failures (configuration,
/// storage, transport) that can surface from any operation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DocSyncError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Folder provisioning error: {0}")]
    FolderProvisioning(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Delete error: {0}")]
    Delete(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocSyncError {
    /// Message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication(msg)
            | Self::FolderProvisioning(msg)
            | Self::Upload(msg)
            | Self::Download(msg)
            | Self::Delete(msg)
            | Self::Sync(msg)
            | Self::Config(msg)
            | Self::InvalidInput(msg)
            | Self::Storage(msg)
            | Self::Network(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias for document sync operations
pub type Result<T> = std::result::Result<T, DocSyncError>;

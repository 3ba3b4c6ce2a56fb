//! SharePoint error classification
//!
//! Remote failures are classified by HTTP status, then surfaced as the
//! domain error variant of the operation that failed.

use std::fmt;

use reqwest::StatusCode;
use tenderdocs_domain::DocSyncError;

/// Category of a failed SharePoint call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePointErrorCategory {
    /// 401 / 403
    Authentication,
    /// 429 or 503 with throttling
    Throttled,
    /// 404
    NotFound,
    /// 409, 412
    Conflict,
    /// Other 4xx
    Validation,
    /// 5xx
    ServerUnavailable,
    Unknown,
}

impl SharePointErrorCategory {
    /// Classify an HTTP status code.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Authentication,
            429 => Self::Throttled,
            404 => Self::NotFound,
            409 | 412 => Self::Conflict,
            400..=499 => Self::Validation,
            500..=599 => Self::ServerUnavailable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for SharePointErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Authentication => "authentication failed",
            Self::Throttled => "throttled",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Validation => "rejected request",
            Self::ServerUnavailable => "server unavailable",
            Self::Unknown => "unexpected response",
        };
        f.write_str(label)
    }
}

/// Remote operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePointOperation {
    FolderExists,
    CreateFolder,
    Upload,
    UpdateMetadata,
    Download,
    ListVersions,
    Delete,
    FileInfo,
    ListFolder,
    ContextInfo,
}

impl SharePointOperation {
    /// Domain error variant for a failure of this operation.
    pub fn error(self, message: impl Into<String>) -> DocSyncError {
        let message = message.into();
        match self {
            Self::FolderExists | Self::CreateFolder => DocSyncError::FolderProvisioning(message),
            Self::Upload | Self::UpdateMetadata | Self::ContextInfo => DocSyncError::Upload(message),
            Self::Download | Self::ListVersions | Self::FileInfo => DocSyncError::Download(message),
            Self::Delete => DocSyncError::Delete(message),
            Self::ListFolder => DocSyncError::Sync(message),
        }
    }

    /// Recast a lower-level failure (transport, digest) into this operation's
    /// variant. Token failures stay `Authentication`.
    pub fn recast(self, err: DocSyncError) -> DocSyncError {
        match err {
            DocSyncError::Authentication(_) | DocSyncError::InvalidInput(_) => err,
            other => self.error(other.message().to_string()),
        }
    }
}

/// Classified SharePoint failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePointError {
    category: SharePointErrorCategory,
    message: String,
    context: Option<String>,
}

impl SharePointError {
    fn new(category: SharePointErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into(), context: None }
    }

    /// Classify a non-success status. The message carries the status text.
    pub fn from_status_code(status: StatusCode) -> Self {
        Self::new(
            SharePointErrorCategory::from_status(status),
            format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
        )
    }

    /// Attach the remote error detail, usually the OData error message.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.trim().is_empty() {
            self.context = Some(context);
        }
        self
    }

    pub fn category(&self) -> SharePointErrorCategory {
        self.category
    }

    /// Surface as the domain error of `operation`, keeping the status text.
    pub fn into_operation_error(self, operation: SharePointOperation) -> DocSyncError {
        operation.error(self.to_string())
    }
}

impl fmt::Display for SharePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SharePointError {}

//! Document-level types exchanged with the remote library

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single metadata field value written to a document's list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Date(DateTime<Utc>),
    Text(String),
}

impl MetadataValue {
    /// JSON representation sent in the list item MERGE body.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Flag(value) => serde_json::Value::Bool(*value),
            Self::Date(value) => serde_json::Value::String(value.to_rfc3339()),
            Self::Text(value) => serde_json::Value::String(value.clone()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<DateTime<Utc>> for MetadataValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// Ordered field name → value map (ordering keeps request bodies stable).
pub type DocumentMetadataMap = BTreeMap<String, MetadataValue>;

/// One file handed to the gateway for upload.
///
/// Created per call and dropped once the call returns; the remote library is
/// the system of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub file_name: String,
    /// Folder relative to the upload template root, e.g. `01. Design`.
    pub folder_path: String,
    pub content: Vec<u8>,
    pub metadata: Option<DocumentMetadataMap>,
}

impl DocumentRecord {
    pub fn new(
        folder_path: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            folder_path: folder_path.into(),
            content: content.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: DocumentMetadataMap) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub success: bool,
    pub unique_id: String,
    pub server_relative_url: String,
    pub version_label: String,
}

/// Read-only projection of one entry in a document's version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub label: String,
    pub created: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub size: u64,
}

/// Checkout state reported by the library (`CheckOutType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Online,
    Offline,
    None,
}

crate::impl_status_conversions!(CheckoutState {
    Online => "online",
    Offline => "offline",
    None => "none",
});

impl CheckoutState {
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Online,
            1 => Self::Offline,
            _ => Self::None,
        }
    }
}

/// Content approval status (`_ModerationStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    Denied,
    Pending,
    Draft,
    Scheduled,
    Unknown(i64),
}

impl ApprovalStatus {
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Approved,
            1 => Self::Denied,
            2 => Self::Pending,
            3 => Self::Draft,
            4 => Self::Scheduled,
            other => Self::Unknown(other),
        }
    }
}

/// Descriptive fields for one remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub id: String,
    pub title: Option<String>,
    pub name: String,
    pub server_relative_url: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub editor: Option<String>,
    pub size: u64,
    pub version_label: Option<String>,
    pub checkout_state: CheckoutState,
    pub approval_status: Option<ApprovalStatus>,
}

/// A file discovered while walking a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub name: String,
    pub server_relative_url: String,
    pub unique_id: String,
    pub size: u64,
    /// Path below the walked folder, `/`-separated, ending in `name`.
    pub relative_path: String,
}

/// A subfolder the walk could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFolder {
    /// Path below the walked folder, `/`-separated.
    pub relative_path: String,
    pub error: String,
}

/// Result of walking a remote folder: every readable file plus the
/// subfolders whose contents could not be listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteListing {
    pub files: Vec<RemoteFile>,
    pub skipped: Vec<SkippedFolder>,
}

impl RemoteListing {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

//! Pull-sync reporting and stored object types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-file outcome of a pull sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFileStatus {
    Synced,
    Failed,
}

crate::impl_status_conversions!(SyncFileStatus {
    Synced => "synced",
    Failed => "failed",
});

/// One entry in a pull-sync report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFileResult {
    pub file_name: String,
    pub status: SyncFileStatus,
    pub storage_key: Option<String>,
    pub error: Option<String>,
}

impl SyncFileResult {
    pub fn synced(file_name: impl Into<String>, storage_key: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: SyncFileStatus::Synced,
            storage_key: Some(storage_key.into()),
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: SyncFileStatus::Failed,
            storage_key: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate pull-sync outcome. Partial failures live in `files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub tender_id: String,
    pub partner_name: Option<String>,
    pub synced_at: DateTime<Utc>,
    pub files: Vec<SyncFileResult>,
}

impl SyncReport {
    #[must_use]
    pub fn synced_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == SyncFileStatus::Synced).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == SyncFileStatus::Failed).count()
    }
}

/// An object as held in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
    pub content: Vec<u8>,
}

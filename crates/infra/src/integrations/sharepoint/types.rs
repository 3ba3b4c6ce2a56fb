//! SharePoint REST wire types (`odata=nometadata` JSON)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tenderdocs_domain::{
    ApprovalStatus, CheckoutState, DocumentMetadata, UploadedDocument, VersionEntry,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ContextInfo {
    pub form_digest_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FolderExists {
    #[serde(default)]
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SpFile {
    pub name: String,
    pub server_relative_url: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default, deserialize_with = "int_or_string")]
    pub length: u64,
    #[serde(rename = "UIVersionLabel", default)]
    pub ui_version_label: Option<String>,
}

impl SpFile {
    pub fn into_uploaded(self) -> UploadedDocument {
        UploadedDocument {
            success: true,
            unique_id: self.unique_id,
            server_relative_url: self.server_relative_url,
            version_label: self.ui_version_label.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SpFolderRef {
    pub name: String,
    pub server_relative_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FolderListing {
    #[serde(default)]
    pub files: Vec<SpFile>,
    #[serde(default)]
    pub folders: Vec<SpFolderRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SpUser {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SpFileVersion {
    pub version_label: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "int_or_string")]
    pub size: u64,
    #[serde(default)]
    pub created_by: Option<SpUser>,
}

impl From<SpFileVersion> for VersionEntry {
    fn from(value: SpFileVersion) -> Self {
        Self {
            label: value.version_label,
            created: value.created,
            author: value.created_by.and_then(|user| user.title),
            size: value.size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpListItemFields {
    #[serde(rename = "OData__ModerationStatus", default)]
    pub moderation_status: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SpFileInfo {
    pub name: String,
    pub server_relative_url: String,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_last_modified: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "int_or_string")]
    pub length: u64,
    #[serde(rename = "UIVersionLabel", default)]
    pub ui_version_label: Option<String>,
    #[serde(default = "checked_in")]
    pub check_out_type: i64,
    #[serde(default)]
    pub author: Option<SpUser>,
    #[serde(default)]
    pub modified_by: Option<SpUser>,
    #[serde(default)]
    pub list_item_all_fields: Option<SpListItemFields>,
}

const fn checked_in() -> i64 {
    2
}

impl From<SpFileInfo> for DocumentMetadata {
    fn from(value: SpFileInfo) -> Self {
        Self {
            id: value.unique_id,
            title: value.title.filter(|t| !t.is_empty()),
            name: value.name,
            server_relative_url: value.server_relative_url,
            created: value.time_created,
            modified: value.time_last_modified,
            author: value.author.and_then(|u| u.title),
            editor: value.modified_by.and_then(|u| u.title),
            size: value.length,
            version_label: value.ui_version_label,
            checkout_state: CheckoutState::from_code(value.check_out_type),
            approval_status: value
                .list_item_all_fields
                .and_then(|fields| fields.moderation_status)
                .map(ApprovalStatus::from_code),
        }
    }
}

/// OData error payload; `nometadata` uses `odata.error`, verbose uses `error`.
#[derive(Debug, Deserialize)]
pub(crate) struct ODataErrorEnvelope {
    #[serde(rename = "odata.error", alias = "error")]
    pub error: ODataError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ODataError {
    #[serde(default)]
    pub message: ODataMessage,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ODataMessage {
    #[serde(default)]
    pub value: String,
}

/// Human-readable detail from an error body, falling back to the raw text.
pub(crate) fn error_detail(body: &str) -> String {
    const MAX_DETAIL: usize = 300;
    let detail = serde_json::from_str::<ODataErrorEnvelope>(body)
        .map(|envelope| envelope.error.message.value)
        .unwrap_or_else(|_| body.trim().to_string());
    detail.chars().take(MAX_DETAIL).collect()
}

/// Edm.Int64 values arrive as JSON strings; accept either form.
fn int_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

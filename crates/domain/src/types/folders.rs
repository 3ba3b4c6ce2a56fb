//! Folder provisioning results

use serde::{Deserialize, Serialize};

/// Outcome of a single remote folder creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderCreation {
    Created,
    /// The remote answered "already exists" (HTTP 409); treated as success.
    AlreadyExists,
}

/// Result of `ensure_folder_tree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderTreeResult {
    pub success: bool,
    /// Library-relative base path, e.g. `EPC_Tender_Docs/SABER-2024-001`.
    pub base_path: String,
    /// Folders created by this call, in creation order. Empty when the tree
    /// already existed.
    #[serde(default)]
    pub created: Vec<String>,
}

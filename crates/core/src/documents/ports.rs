//! Port interfaces for document synchronization

use async_trait::async_trait;
use tenderdocs_domain::{
    DocumentMetadata, DocumentMetadataMap, FolderCreation, RemoteListing, Result, StoredObject,
    UploadedDocument, VersionEntry,
};

/// Provides bearer tokens for the document library API.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Retrieve a valid bearer token, acquiring a new one when needed.
    async fn access_token(&self) -> Result<String>;
}

/// Remote document library operations.
///
/// Folder arguments are library-relative (`EPC_Tender_Docs/T-1/EPC Uploads`);
/// file arguments are server-relative URLs as returned by the library.
/// Implementations report failures with the operation's error variant
/// (`FolderProvisioning`, `Upload`, `Download`, `Delete`, `Sync`) and token
/// failures as `Authentication`.
#[async_trait]
pub trait DocumentLibrary: Send + Sync {
    /// Whether the folder exists.
    async fn folder_exists(&self, folder: &str) -> Result<bool>;

    /// Create one folder. "Already exists" is a success.
    async fn create_folder(&self, folder: &str) -> Result<FolderCreation>;

    /// Upload (overwriting) a file into an existing folder.
    async fn upload_file(
        &self,
        folder: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadedDocument>;

    /// Patch list item fields of an uploaded file.
    async fn update_metadata(
        &self,
        server_relative_url: &str,
        metadata: &DocumentMetadataMap,
    ) -> Result<()>;

    /// Fetch raw file bytes.
    async fn download_file(&self, server_relative_url: &str) -> Result<Vec<u8>>;

    /// Version history in the order the library returns it.
    async fn list_versions(&self, server_relative_url: &str) -> Result<Vec<VersionEntry>>;

    /// Delete a file unconditionally.
    async fn delete_file(&self, server_relative_url: &str) -> Result<()>;

    /// Descriptive fields for one file.
    async fn file_metadata(&self, server_relative_url: &str) -> Result<DocumentMetadata>;

    /// All files below a folder, walking subfolders.
    ///
    /// Fails only when `folder` itself cannot be read; unreadable subfolders
    /// are reported in `RemoteListing::skipped`.
    async fn list_files(&self, folder: &str) -> Result<RemoteListing>;
}

/// Key/value object storage used by pull sync.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write an object, replacing any existing object at the key.
    async fn put(&self, object: StoredObject) -> Result<()>;

    /// Read an object; `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>>;

    /// Keys under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

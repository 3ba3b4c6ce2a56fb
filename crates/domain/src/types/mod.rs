//! Domain types and models

pub mod documents;
pub mod folders;
pub mod sync;
pub mod token;

pub use documents::{
    ApprovalStatus, CheckoutState, DocumentMetadata, DocumentMetadataMap, DocumentRecord,
    MetadataValue, RemoteFile, RemoteListing, SkippedFolder, UploadedDocument, VersionEntry,
};
pub use folders::{FolderCreation, FolderTreeResult};
pub use sync::{StoredObject, SyncFileResult, SyncFileStatus, SyncReport};
pub use token::AccessToken;

//! # Tender Docs Core
//!
//! Pure orchestration layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the document library, object
//!   storage and token acquisition
//! - The fixed per-tender folder template and path rules
//! - `DocumentSyncGateway`, the service callers use
//!
//! ## Architecture Principles
//! - Only depends on `tenderdocs-domain`
//! - No HTTP, storage SDK or filesystem code
//! - All external dependencies via traits

pub mod documents;

pub use documents::paths::{self, FOLDER_TEMPLATE};
pub use documents::ports::{AccessTokenProvider, DocumentLibrary, ObjectStorage};
pub use documents::service::DocumentSyncGateway;

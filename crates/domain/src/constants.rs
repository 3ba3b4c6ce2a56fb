//! Domain constants
//!
//! Centralized location for the fixed names the gateway writes into the
//! remote library and object storage.

/// Default document library (root folder) holding tender folders.
pub const DEFAULT_LIBRARY_NAME: &str = "EPC_Tender_Docs";

/// Folder below each tender/partner base that holds the upload template.
pub const UPLOADS_FOLDER: &str = "EPC Uploads";

/// Prefix for keys written by pull sync.
pub const STORAGE_KEY_PREFIX: &str = "documents";

/// Provenance metadata attached to every object copied by pull sync.
pub const META_SOURCE: &str = "source";
pub const META_SOURCE_VALUE: &str = "sharepoint";
pub const META_REMOTE_ID: &str = "sharepoint-id";
pub const META_SYNCED_AT: &str = "synced-at";

/// Fallback content type for objects whose extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default identity provider host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Refresh cached tokens this many seconds before they expire.
pub const DEFAULT_TOKEN_REFRESH_SKEW_SECS: i64 = 300;

/// Request timeout applied to every remote call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

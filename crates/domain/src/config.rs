//! Configuration structures
//!
//! Values are injected into the gateway at construction time. Loading from
//! the environment or files lives in the infra crate.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTHORITY_HOST, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LIBRARY_NAME,
    DEFAULT_TOKEN_REFRESH_SKEW_SECS,
};
use crate::errors::{DocSyncError, Result};

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSyncConfig {
    #[serde(default)]
    pub sharepoint: SharePointConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Identity and document library settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePointConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    /// Inline PEM bundle (certificate + private key).
    #[serde(default)]
    pub certificate: Option<String>,
    /// Path to a PEM bundle; used when `certificate` is absent.
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,
    /// Decrypts an `ENCRYPTED PRIVATE KEY` block in the bundle.
    #[serde(default)]
    pub certificate_password: Option<String>,
    /// Site URL, e.g. `https://contoso.sharepoint.com/sites/Tenders`.
    #[serde(default)]
    pub site_url: String,
    #[serde(default = "default_library_name")]
    pub library_name: String,
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    #[serde(default = "default_refresh_skew")]
    pub token_refresh_skew_secs: i64,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            certificate: None,
            certificate_path: None,
            certificate_password: None,
            site_url: String::new(),
            library_name: default_library_name(),
            authority_host: default_authority_host(),
            token_refresh_skew_secs: default_refresh_skew(),
        }
    }
}

impl SharePointConfig {
    /// Fail fast with every missing credential named at once.
    ///
    /// # Errors
    /// Returns `DocSyncError::Authentication` listing each missing field.
    pub fn require_credentials(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.tenant_id.trim().is_empty() {
            missing.push("tenant_id");
        }
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        let has_inline = self.certificate.as_deref().is_some_and(|c| !c.trim().is_empty());
        if !has_inline && self.certificate_path.is_none() {
            missing.push("certificate");
        }
        if self.site_url.trim().is_empty() {
            missing.push("site_url");
        }
        if self.library_name.trim().is_empty() {
            missing.push("library_name");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DocSyncError::Authentication(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for SharePointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharePointConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("certificate", &self.certificate.as_ref().map(|_| "<redacted>"))
            .field("certificate_path", &self.certificate_path)
            .field("certificate_password", &self.certificate_password.as_ref().map(|_| "<redacted>"))
            .field("site_url", &self.site_url)
            .field("library_name", &self.library_name)
            .field("authority_host", &self.authority_host)
            .field("token_refresh_skew_secs", &self.token_refresh_skew_secs)
            .finish()
    }
}

/// Object storage settings (S3-compatible, e.g. R2)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Transport settings shared by every remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Total attempts per request. `1` disables internal retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout(), max_attempts: default_max_attempts() }
    }
}

fn default_library_name() -> String {
    DEFAULT_LIBRARY_NAME.to_string()
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

const fn default_refresh_skew() -> i64 {
    DEFAULT_TOKEN_REFRESH_SKEW_SECS
}

fn default_region() -> String {
    "auto".to_string()
}

const fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

const fn default_max_attempts() -> usize {
    1
}

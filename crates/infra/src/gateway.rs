//! Wiring of the gateway from configuration

use std::sync::Arc;

use tenderdocs_core::DocumentSyncGateway;
use tenderdocs_domain::{DocSyncConfig, Result};
use tracing::info;

use crate::http::HttpClient;
use crate::integrations::sharepoint::{CertificateTokenProvider, SharePointClient};
use crate::storage::ObjectStoreStorage;

/// Build a gateway backed by SharePoint and, when a bucket is configured,
/// S3-compatible object storage.
///
/// Credentials are not checked here; the first remote call reports missing
/// identity settings as `Authentication`. Token requests use their own
/// single-attempt transport; `http.max_attempts` applies to SharePoint calls.
///
/// # Errors
/// `DocSyncError::Config` for an unusable site URL or storage settings.
pub fn build_gateway(config: &DocSyncConfig) -> Result<DocumentSyncGateway> {
    let http_client = HttpClient::from_config(&config.http)?;
    let token_provider =
        Arc::new(CertificateTokenProvider::from_config(config.sharepoint.clone(), &config.http)?);
    let library = SharePointClient::new(&config.sharepoint.site_url, http_client, token_provider)?;

    let mut gateway = DocumentSyncGateway::new(Arc::new(library), config.sharepoint.library_name.clone());

    if config.storage.bucket.is_some() {
        gateway = gateway.with_storage(Arc::new(ObjectStoreStorage::from_config(&config.storage)?));
    }

    info!(
        site = %config.sharepoint.site_url,
        library = %config.sharepoint.library_name,
        storage = config.storage.bucket.is_some(),
        "document sync gateway ready"
    );
    Ok(gateway)
}

/// Load configuration (env, `.env`, file) and build the gateway.
///
/// # Errors
/// See [`crate::config::load`] and [`build_gateway`].
pub fn gateway_from_env() -> Result<DocumentSyncGateway> {
    let config = crate::config::load()?;
    build_gateway(&config)
}

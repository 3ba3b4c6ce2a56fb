//! Client-credentials token provider with in-process caching

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tenderdocs_core::AccessTokenProvider;
use tenderdocs_domain::{AccessToken, DocSyncError, HttpConfig, Result, SharePointConfig};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::auth::{ClientAssertionSigner, ClientCertificate};
use crate::http::HttpClient;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

const fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Acquires app-only tokens with a certificate assertion and caches them
/// until they come within the refresh skew of expiry.
pub struct CertificateTokenProvider {
    http_client: HttpClient,
    config: SharePointConfig,
    cached: Mutex<Option<AccessToken>>,
}

impl CertificateTokenProvider {
    pub fn new(config: SharePointConfig, http_client: HttpClient) -> Self {
        Self { http_client, config, cached: Mutex::new(None) }
    }

    /// Provider with its own transport: the configured timeout, one attempt.
    ///
    /// # Errors
    /// `DocSyncError::Network` when the HTTP client cannot be built.
    pub fn from_config(config: SharePointConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self::new(config, HttpClient::single_attempt(http)?))
    }

    /// `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_host.trim_end_matches('/'),
            self.config.tenant_id
        )
    }

    /// `{site origin}/.default`
    ///
    /// # Errors
    /// `DocSyncError::Authentication` when the site URL does not parse.
    pub fn scope(&self) -> Result<String> {
        let site = url::Url::parse(&self.config.site_url).map_err(|e| {
            DocSyncError::Authentication(format!("invalid site url {:?}: {e}", self.config.site_url))
        })?;
        Ok(format!("{}/.default", site.origin().ascii_serialization()))
    }

    /// Request a new token from the identity provider, bypassing the cache.
    ///
    /// Single attempt. Every failure is `DocSyncError::Authentication`.
    pub async fn acquire_access_token(&self) -> Result<AccessToken> {
        self.config.require_credentials()?;

        let certificate = ClientCertificate::from_config(&self.config)?;
        let endpoint = self.token_endpoint();
        let assertion =
            ClientAssertionSigner::new(certificate, self.config.client_id.clone(), endpoint.clone())
                .sign()?;
        let scope = self.scope()?;

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope.as_str()),
        ];

        debug!(tenant_id = %self.config.tenant_id, scope = %scope, "requesting access token");
        let request = self.http_client.request(Method::POST, &endpoint).form(&form);
        let response = self.http_client.send(request).await.map_err(|e| {
            DocSyncError::Authentication(format!("token request failed: {}", e.message()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| format!("{}: {}", e.error, e.error_description))
                .unwrap_or(body);
            warn!(tenant_id = %self.config.tenant_id, status = status.as_u16(), "token request rejected");
            return Err(DocSyncError::Authentication(format!(
                "token request rejected (HTTP {}): {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            DocSyncError::Authentication(format!("invalid token response: {e}"))
        })?;

        info!(
            tenant_id = %self.config.tenant_id,
            expires_in = token.expires_in,
            "access token acquired"
        );
        Ok(AccessToken::from_expires_in(token.access_token, token.expires_in))
    }

    /// Drop the cached token so the next call re-acquires.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[async_trait]
impl AccessTokenProvider for CertificateTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired(self.config.token_refresh_skew_secs) {
                return Ok(token.token.clone());
            }
            debug!("cached access token near expiry, refreshing");
        }

        let token = self.acquire_access_token().await?;
        let bearer = token.token.clone();
        *cached = Some(token);
        Ok(bearer)
    }
}

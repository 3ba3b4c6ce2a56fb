//! Certificate-based client assertion
//!
//! The app registration authenticates with a signed JWT instead of a client
//! secret:
//!
//! 1. Load the certificate and RSA private key from a PEM bundle
//! 2. Sign an RS256 assertion whose `x5t` header identifies the certificate
//! 3. Exchange it for a bearer token (see `token.rs`)

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tenderdocs_domain::{DocSyncError, Result, SharePointConfig};
use uuid::Uuid;

use crate::errors::InfraError;

/// Assertion lifetime in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 600;

/// Claims of the client assertion JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Token endpoint the assertion is presented to.
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material loaded from a PEM bundle.
#[derive(Clone)]
pub struct ClientCertificate {
    x5t: String,
    encoding_key: EncodingKey,
}

impl ClientCertificate {
    /// Parse a bundle holding a `CERTIFICATE` block and one of `PRIVATE KEY`,
    /// `RSA PRIVATE KEY` or `ENCRYPTED PRIVATE KEY`.
    ///
    /// # Errors
    /// `DocSyncError::Authentication` when a block is missing, the key cannot
    /// be decoded, or an encrypted key has no (or a wrong) password.
    pub fn from_pem(bundle: &str, password: Option<&str>) -> Result<Self> {
        let blocks = pem::parse_many(bundle).map_err(InfraError::from)?;

        let certificate = blocks.iter().find(|block| block.tag() == "CERTIFICATE").ok_or_else(|| {
            DocSyncError::Authentication("certificate bundle has no CERTIFICATE block".into())
        })?;
        let key_block = blocks
            .iter()
            .find(|block| block.tag().ends_with("PRIVATE KEY"))
            .ok_or_else(|| {
                DocSyncError::Authentication("certificate bundle has no private key".into())
            })?;

        let private_key = match key_block.tag() {
            "PRIVATE KEY" => {
                RsaPrivateKey::from_pkcs8_der(key_block.contents()).map_err(InfraError::from)?
            }
            "RSA PRIVATE KEY" => {
                RsaPrivateKey::from_pkcs1_der(key_block.contents()).map_err(InfraError::from)?
            }
            "ENCRYPTED PRIVATE KEY" => {
                let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
                    DocSyncError::Authentication(
                        "private key is encrypted but no certificate password is configured".into(),
                    )
                })?;
                RsaPrivateKey::from_pkcs8_encrypted_der(key_block.contents(), password)
                    .map_err(InfraError::from)?
            }
            other => {
                return Err(DocSyncError::Authentication(format!(
                    "unsupported private key type: {other}"
                )))
            }
        };

        let pkcs1 = private_key.to_pkcs1_der().map_err(InfraError::from)?;
        let encoding_key = EncodingKey::from_rsa_der(pkcs1.as_bytes());

        Ok(Self { x5t: thumbprint(certificate.contents()), encoding_key })
    }

    /// Load from config: the inline bundle wins over `certificate_path`.
    ///
    /// # Errors
    /// `DocSyncError::Authentication` when neither source is usable.
    pub fn from_config(config: &SharePointConfig) -> Result<Self> {
        let password = config.certificate_password.as_deref();
        if let Some(inline) = config.certificate.as_deref().filter(|c| !c.trim().is_empty()) {
            return Self::from_pem(inline, password);
        }

        let path = config.certificate_path.as_ref().ok_or_else(|| {
            DocSyncError::Authentication("missing required configuration: certificate".into())
        })?;
        let bundle = std::fs::read_to_string(path).map_err(|e| {
            DocSyncError::Authentication(format!(
                "failed to read certificate {}: {e}",
                path.display()
            ))
        })?;
        Self::from_pem(&bundle, password)
    }

    /// Base64url SHA-1 thumbprint of the certificate DER.
    pub fn x5t(&self) -> &str {
        &self.x5t
    }
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate").field("x5t", &self.x5t).finish_non_exhaustive()
    }
}

fn thumbprint(der: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha1::digest(der))
}

/// Signs short-lived client assertions for one app registration.
#[derive(Debug, Clone)]
pub struct ClientAssertionSigner {
    certificate: ClientCertificate,
    client_id: String,
    audience: String,
}

impl ClientAssertionSigner {
    pub fn new(
        certificate: ClientCertificate,
        client_id: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self { certificate, client_id: client_id.into(), audience: token_endpoint.into() }
    }

    pub fn claims(&self) -> AssertionClaims {
        let now = Utc::now().timestamp();
        AssertionClaims {
            aud: self.audience.clone(),
            iss: self.client_id.clone(),
            sub: self.client_id.clone(),
            jti: Uuid::new_v4().to_string(),
            nbf: now,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Produce a fresh signed assertion.
    ///
    /// # Errors
    /// `DocSyncError::Authentication` if signing fails.
    pub fn sign(&self) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(self.certificate.x5t().to_string());

        let assertion =
            encode(&header, &self.claims(), &self.certificate.encoding_key).map_err(InfraError::from)?;
        Ok(assertion)
    }
}

//! Conversions from external infrastructure errors into domain errors.

use jsonwebtoken::errors::Error as JwtError;
use object_store::Error as ObjectStoreError;
use pem::PemError;
use reqwest::Error as HttpError;
use rsa::pkcs1::Error as Pkcs1Error;
use rsa::pkcs8::Error as Pkcs8Error;
use tenderdocs_domain::DocSyncError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DocSyncError);

impl From<InfraError> for DocSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DocSyncError> for InfraError {
    fn from(value: DocSyncError) -> Self {
        Self(value)
    }
}

trait IntoDocSyncError {
    fn into_doc_sync(self) -> DocSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DocSyncError */
/* -------------------------------------------------------------------------- */

impl IntoDocSyncError for HttpError {
    fn into_doc_sync(self) -> DocSyncError {
        if self.is_timeout() {
            return DocSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DocSyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => DocSyncError::Authentication(message),
                400..=499 => DocSyncError::InvalidInput(message),
                _ => DocSyncError::Network(message),
            };
        }

        DocSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_doc_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* object_store::Error → DocSyncError */
/* -------------------------------------------------------------------------- */

impl IntoDocSyncError for ObjectStoreError {
    fn into_doc_sync(self) -> DocSyncError {
        match self {
            ObjectStoreError::NotFound { path, .. } => {
                DocSyncError::Storage(format!("object not found: {path}"))
            }
            ObjectStoreError::AlreadyExists { path, .. } => {
                DocSyncError::Storage(format!("object already exists: {path}"))
            }
            ObjectStoreError::Generic { store, source } => {
                DocSyncError::Storage(format!("{store} storage error: {source}"))
            }
            other => DocSyncError::Storage(other.to_string()),
        }
    }
}

impl From<ObjectStoreError> for InfraError {
    fn from(value: ObjectStoreError) -> Self {
        Self(value.into_doc_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* certificate and assertion errors → DocSyncError::Authentication */
/* -------------------------------------------------------------------------- */

impl From<JwtError> for InfraError {
    fn from(value: JwtError) -> Self {
        Self(DocSyncError::Authentication(format!("failed to sign client assertion: {value}")))
    }
}

impl From<PemError> for InfraError {
    fn from(value: PemError) -> Self {
        Self(DocSyncError::Authentication(format!("invalid PEM certificate bundle: {value}")))
    }
}

impl From<Pkcs8Error> for InfraError {
    fn from(value: Pkcs8Error) -> Self {
        let message = match value {
            Pkcs8Error::EncryptedPrivateKey(_) => {
                "private key could not be decrypted; check the certificate password".to_string()
            }
            other => format!("invalid PKCS#8 private key: {other}"),
        };
        Self(DocSyncError::Authentication(message))
    }
}

impl From<Pkcs1Error> for InfraError {
    fn from(value: Pkcs1Error) -> Self {
        Self(DocSyncError::Authentication(format!("invalid RSA private key: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
};
use tenderdocs_core::ObjectStorage;
use tenderdocs_domain::constants::DEFAULT_CONTENT_TYPE;
use tenderdocs_domain::{DocSyncError, Result, StorageConfig, StoredObject};
use tracing::{debug, error, info};

use crate::errors::InfraError;

/// `ObjectStorage` over any `object_store` backend.
///
/// Content type and custom metadata travel as object attributes, so they
/// survive a round trip on S3/R2 and in memory alike.
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    backend: String,
}

impl ObjectStoreStorage {
    pub fn new(store: Arc<dyn ObjectStore>, backend: impl Into<String>) -> Self {
        Self { store, backend: backend.into() }
    }

    /// Process-local store, used in tests and dry runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    /// S3-compatible bucket (Cloudflare R2 when `endpoint` is set).
    ///
    /// Credentials fall back to the standard `AWS_*` environment variables.
    ///
    /// # Errors
    /// `DocSyncError::Config` when no bucket is configured or the builder
    /// rejects the settings.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| DocSyncError::Config("storage bucket is not configured".into()))?;

        let mut builder =
            AmazonS3Builder::from_env().with_bucket_name(bucket).with_region(config.region.clone());

        if let Some(endpoint) = config.endpoint.as_deref() {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        if let (Some(key_id), Some(secret)) =
            (config.access_key_id.as_deref(), config.secret_access_key.as_deref())
        {
            builder = builder.with_access_key_id(key_id).with_secret_access_key(secret);
        }

        let store = builder
            .build()
            .map_err(|e| DocSyncError::Config(format!("invalid storage configuration: {e}")))?;

        info!(bucket, endpoint = ?config.endpoint, "object storage configured");
        Ok(Self::new(Arc::new(store), format!("s3://{bucket}")))
    }
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    async fn put(&self, object: StoredObject) -> Result<()> {
        let start = Instant::now();
        let location = Path::from(object.key.as_str());
        let size = object.content.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, AttributeValue::from(object.content_type));
        for (name, value) in object.metadata {
            attributes.insert(Attribute::Metadata(name.into()), AttributeValue::from(value));
        }
        let options = PutOptions { attributes, ..PutOptions::default() };

        self.store
            .put_opts(&location, PutPayload::from(object.content), options)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    backend = %self.backend,
                    key = %object.key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "object upload failed"
                );
                InfraError::from(e)
            })?;

        debug!(
            backend = %self.backend,
            key = %object.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "object stored"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        let location = Path::from(key);
        let result = match self.store.get_opts(&location, GetOptions::default()).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(InfraError::from(e).into()),
        };

        let mut content_type = DEFAULT_CONTENT_TYPE.to_string();
        let mut metadata = BTreeMap::new();
        for (attribute, value) in result.attributes.iter() {
            let value: &str = value.as_ref();
            match attribute {
                Attribute::ContentType => content_type = value.to_string(),
                Attribute::Metadata(name) => {
                    metadata.insert(name.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        let content = result.bytes().await.map_err(InfraError::from)?;
        Ok(Some(StoredObject { key: key.to_string(), content_type, metadata, content: content.to_vec() }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_matches('/');
        let prefix_path = (!prefix.is_empty()).then(|| Path::from(prefix));

        let mut keys: Vec<String> = self
            .store
            .list(prefix_path.as_ref())
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .map_err(InfraError::from)?;
        keys.sort();
        Ok(keys)
    }
}

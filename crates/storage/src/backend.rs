use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::ObjectStore;
use tracing::info;

use sentiment_core::config::ObjectStoreConfig;

use crate::error::StorageError;

/// Blob-level object store: `put`/`get`/`exists`, backed by either an
/// S3-compatible bucket or GCS. Overwrite on collision is permitted and
/// expected — archival is idempotent re-archive, not append-only.
pub enum ObjectStoreClient {
    S3(S3Backend),
    Gcs(GcsBackend),
}

impl ObjectStoreClient {
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        match config.backend.as_str() {
            "s3" => Ok(ObjectStoreClient::S3(S3Backend::new(config)?)),
            "gcs" => Ok(ObjectStoreClient::Gcs(GcsBackend::new(config)?)),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }

    fn store(&self) -> &dyn ObjectStore {
        match self {
            ObjectStoreClient::S3(b) => b.store.as_ref(),
            ObjectStoreClient::Gcs(b) => b.store.as_ref(),
        }
    }

    fn full_key(&self, key: &str) -> object_store::path::Path {
        let prefix = match self {
            ObjectStoreClient::S3(b) => &b.prefix,
            ObjectStoreClient::Gcs(b) => &b.prefix,
        };
        if prefix.is_empty() {
            object_store::path::Path::from(key)
        } else {
            object_store::path::Path::from(format!("{prefix}/{key}"))
        }
    }

    /// Write `data` to `key`, overwriting any existing blob. Returns the
    /// canonical URI of the stored object.
    pub async fn put(&self, key: &str, data: Vec<u8>) -> Result<String, StorageError> {
        let path = self.full_key(key);
        self.store()
            .put(&path, object_store::PutPayload::from(data))
            .await?;
        Ok(self.uri(key))
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.full_key(key);
        let result = self.store().get(&path).await?;
        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.full_key(key);
        match self.store().head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn uri(&self, key: &str) -> String {
        match self {
            ObjectStoreClient::S3(b) => format!("s3://{}/{}", b.bucket, key),
            ObjectStoreClient::Gcs(b) => format!("gs://{}/{}", b.bucket, key),
        }
    }
}

/// S3-compatible backend (optional endpoint override for MinIO-style
/// deployments).
pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl S3Backend {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("S3_BUCKET not set".into()))?;

        let mut builder = AmazonS3Builder::new().with_region(&config.region);

        if let Some(ref key) = config.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }

        if let Some(ref endpoint) = config.endpoint_url {
            if !endpoint.is_empty() {
                let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.clone()
                } else {
                    format!("https://{endpoint}")
                };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_endpoint(&endpoint_url)
                    .with_allow_http(endpoint_url.starts_with("http://"));
            }
        } else {
            builder = builder.with_url(format!("s3://{bucket}"));
        }

        let store = builder.build()?;

        info!("Storage: S3 backend s3://{} (region: {})", bucket, config.region);

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            prefix: String::new(),
        })
    }
}

/// GCS backend, authenticated via Application Default Credentials.
pub struct GcsBackend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl GcsBackend {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("GCS_BUCKET not set".into()))?;

        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);

        if let Some(ref service_account) = config.gcs_service_account_path {
            builder = builder.with_service_account_path(service_account);
        }

        let store = builder.build()?;

        info!("Storage: GCS backend gs://{}", bucket);

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            prefix: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        let config = ObjectStoreConfig {
            backend: "azure".to_string(),
            bucket: Some("b".to_string()),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            gcs_service_account_path: None,
        };
        let result = ObjectStoreClient::from_config(&config);
        assert!(result.is_err());
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let config = ObjectStoreConfig {
            backend: "s3".to_string(),
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            gcs_service_account_path: None,
        };
        let result = S3Backend::new(&config);
        assert!(result.is_err());
    }
}

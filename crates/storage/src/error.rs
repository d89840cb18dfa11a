use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("unknown storage backend: {0} (expected 's3' or 'gcs')")]
    UnknownBackend(String),
}

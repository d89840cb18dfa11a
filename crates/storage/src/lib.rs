pub mod backend;
pub mod error;

pub use backend::{GcsBackend, ObjectStoreClient, S3Backend};
pub use error::StorageError;

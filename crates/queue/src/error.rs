//! Queue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("message parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("unknown queue mode: {0} (expected 'list' or 'stream')")]
    UnknownMode(String),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("queue error: {0}")]
    Queue(#[from] sentiment_queue::QueueError),
}

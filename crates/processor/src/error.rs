use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("queue error: {0}")]
    Queue(#[from] sentiment_queue::QueueError),
}

pub mod client;
pub mod error;

pub use client::{QueueClient, QueueHealth, QueueMode};
pub use error::QueueError;

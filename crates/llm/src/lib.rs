pub mod client;
pub mod normalizer;
pub mod provider;
pub mod providers;

pub use client::LlmClient;
pub use normalizer::extract_json;
pub use provider::{LlmError, LlmProvider, Message, Role};

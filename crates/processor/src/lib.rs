pub mod api;
pub mod error;
pub mod service;
pub mod state;

pub use error::ProcessorError;
pub use service::{BatchStats, ItemError, ProcessorHealth, ProcessorService};
pub use state::AppState;

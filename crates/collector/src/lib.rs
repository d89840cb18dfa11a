pub mod adapters;
pub mod api;
pub mod error;
pub mod service;
pub mod state;

pub use adapters::build_adapters;
pub use error::CollectorError;
pub use service::{CollectStats, CollectorService, SourceError};
pub use state::AppState;

use std::sync::Arc;

use crate::service::CollectorService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CollectorService>,
}

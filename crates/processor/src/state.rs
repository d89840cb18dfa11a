use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::service::{BatchStats, ProcessorService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProcessorService>,
    /// Set once continuous mode is already running, so a second
    /// `POST /process/continuous` can report it's already active instead
    /// of spawning a duplicate drain loop.
    pub continuous_running: Arc<std::sync::atomic::AtomicBool>,
    pub continuous_shutdown: Arc<Notify>,
    /// Handle to the spawned continuous-drain task, held so `main()` can
    /// join it after graceful shutdown instead of racing its final tally
    /// log against process exit.
    pub continuous_task: Arc<Mutex<Option<JoinHandle<BatchStats>>>>,
}

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use sentiment_core::Config;
use sentiment_db::RelationalStore;
use sentiment_llm::LlmClient;
use sentiment_processor::{api, AppState, ProcessorService};
use sentiment_queue::QueueClient;
use sentiment_storage::ObjectStoreClient;
use tokio::sync::{Mutex, Notify};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    sentiment_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let queue = QueueClient::connect(
        &config.queue.url,
        config.queue.mode.parse()?,
        Duration::from_secs(config.queue.poll_timeout_secs as u64),
    )
    .await?;
    let storage = ObjectStoreClient::from_config(&config.object_store)?;
    let llm = LlmClient::from_config(&config.llm)?;
    let db = RelationalStore::connect(&config.database).await?;
    info!("queue, object store, LLM provider, and database are all ready");

    let service = Arc::new(ProcessorService::new(
        queue,
        storage,
        llm,
        db,
        config.queue.topic.clone(),
        config.processor.batch_size as usize,
        config.processor.skip_existing,
    ));

    let state = Arc::new(AppState {
        service,
        continuous_running: Arc::new(AtomicBool::new(false)),
        continuous_shutdown: Arc::new(Notify::new()),
        continuous_task: Arc::new(Mutex::new(None)),
    });

    let app = Router::new()
        .route("/process", post(api::process))
        .route("/process/continuous", post(api::process_continuous))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("processor listening on http://{addr}");

    let shutdown_state = state.clone();
    let shutdown_signal = async move {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl_c");
        info!("received shutdown signal, stopping continuous processing");
        shutdown_state.continuous_shutdown.notify_waiters();
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;

    if let Some(handle) = state.continuous_task.lock().await.take() {
        if let Err(e) = handle.await {
            warn!(error = %e, "continuous processing task panicked");
        }
    }

    Ok(())
}

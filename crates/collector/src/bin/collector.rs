use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use sentiment_collector::{api, build_adapters, AppState, CollectorService};
use sentiment_core::Config;
use sentiment_queue::QueueClient;
use tower_http::cors::CorsLayer;
use tracing::info;

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

    let adapters = build_adapters(&config.sources);
    info!(count = adapters.len(), "source adapters configured");

    let queue = QueueClient::connect(
        &config.queue.url,
        config.queue.mode.parse()?,
        Duration::from_secs(config.queue.poll_timeout_secs as u64),
    )
    .await?;
    info!(mode = ?config.queue.mode, topic = %config.queue.topic, "queue client connected");

    let service = Arc::new(CollectorService::new(adapters, queue, config.queue.topic.clone()));
    let state = Arc::new(AppState { service });

    let app = Router::new()
        .route("/collect", post(api::collect))
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("collector listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

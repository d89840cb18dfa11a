//! `POST /process`, `POST /process/continuous`, `GET /health`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::service::{BatchStats, ProcessorHealth};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ProcessRequest {
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<BatchStats>, (StatusCode, Json<ErrorResponse>)> {
    state
        .service
        .process_batch(request.batch_size)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))
}

#[derive(Debug, Serialize)]
pub struct ContinuousResponse {
    pub started: bool,
}

pub async fn process_continuous(State(state): State<Arc<AppState>>) -> Json<ContinuousResponse> {
    if state.continuous_running.swap(true, Ordering::SeqCst) {
        return Json(ContinuousResponse { started: false });
    }

    let service = state.service.clone();
    let shutdown = state.continuous_shutdown.clone();
    let running_flag = state.continuous_running.clone();
    let handle = tokio::spawn(async move {
        info!("continuous processing started");
        let totals = service.run_continuous(shutdown).await;
        info!(processed = totals.processed, skipped = totals.skipped, "continuous processing loop exited");
        running_flag.store(false, Ordering::SeqCst);
        totals
    });
    *state.continuous_task.lock().await = Some(handle);

    Json(ContinuousResponse { started: true })
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ProcessorHealth>) {
    let health = state.service.health_check().await;
    if !health.queue_connected || !health.database_connected {
        error!(?health, "processor health check degraded");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(health));
    }
    (StatusCode::OK, Json(health))
}

//! `POST /collect`, `GET /health`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use sentiment_core::{SearchRequest, SourceType};
use serde::{Deserialize, Serialize};

use crate::service::CollectStats;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    pub phrase: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sources: Option<Vec<SourceType>>,
    pub job_id: Option<String>,
}

impl CollectRequest {
    fn into_search_request(self) -> SearchRequest {
        let end_date = self.end_date.unwrap_or_else(Utc::now);
        let start_date = self.start_date.unwrap_or_else(|| end_date - Duration::days(7));
        let job_id = self.job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        SearchRequest {
            phrase: self.phrase,
            start_date,
            end_date,
            job_id,
            sources: self.sources,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn collect(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CollectRequest>,
) -> Result<Json<CollectStats>, (StatusCode, Json<ErrorResponse>)> {
    let request = request.into_search_request();
    state
        .service
        .collect(request)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_connected: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let queue_connected = state.service.health_check().await;
    let body = HealthResponse {
        status: if queue_connected { "ok" } else { "degraded" },
        queue_connected,
    };
    if queue_connected {
        (StatusCode::OK, Json(body))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}

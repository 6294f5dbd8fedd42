use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use turnos_core::{RefreshStatus, RefreshSummary, SanitizedConfig};

use super::error::{self, ApiError};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub refresh: RefreshStatus,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        refresh: state.refresher().status().await,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Refetch the whole snapshot from the backend now.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshSummary>, ApiError> {
    let summary = state
        .refresher()
        .refresh_once()
        .await
        .map_err(error::backend)?;
    Ok(Json(summary))
}

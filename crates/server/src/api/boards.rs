//! Public display boards, computed from the cached snapshot per request.

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use turnos_core::{
    attention_board, dashboard_summary, waiting_board, AttentionBoard, DashboardSummary,
    WaitingBoard,
};

use crate::state::AppState;

pub async fn get_waiting_board(State(state): State<Arc<AppState>>) -> Json<WaitingBoard> {
    let cache = state.cache().read().await;
    Json(waiting_board(cache.snapshot(), state.board_limits(), Utc::now()))
}

pub async fn get_attention_board(State(state): State<Arc<AppState>>) -> Json<AttentionBoard> {
    let cache = state.cache().read().await;
    Json(attention_board(cache.snapshot(), state.board_limits(), Utc::now()))
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSummary> {
    let cache = state.cache().read().await;
    Json(dashboard_summary(cache.snapshot(), state.board_limits(), Utc::now()))
}

//! Table API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;
use turnos_core::{callable_tables, CreateTableRequest, Table, UpdateTableRequest};

use super::error::{self, ApiError};
use crate::state::AppState;

/// List cached tables ordered by number
pub async fn list_tables(State(state): State<Arc<AppState>>) -> Json<Vec<Table>> {
    let cache = state.cache().read().await;
    let mut tables = cache.tables().to_vec();
    tables.sort_by_key(|t| t.number);
    Json(tables)
}

/// Tables a waiting ticket can be called to
pub async fn list_callable_tables(State(state): State<Arc<AppState>>) -> Json<Vec<Table>> {
    let cache = state.cache().read().await;
    Json(callable_tables(cache.tables()))
}

pub async fn create_table(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<Table>), ApiError> {
    body.validate().map_err(error::validation)?;

    let table = state
        .backend()
        .create_table(&body)
        .await
        .map_err(error::backend)?;
    info!(table_id = %table.id, number = table.number, "Table created");

    state.cache().write().await.upsert_table(table.clone());
    state.ws_broadcaster().tables_changed();

    Ok((StatusCode::CREATED, Json(table)))
}

pub async fn update_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTableRequest>,
) -> Result<Json<Table>, ApiError> {
    body.validate().map_err(error::validation)?;

    let table = state
        .backend()
        .update_table(&id, &body)
        .await
        .map_err(error::backend)?;

    state.cache().write().await.upsert_table(table.clone());
    state.ws_broadcaster().tables_changed();

    Ok(Json(table))
}

pub async fn delete_table(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .backend()
        .delete_table(&id)
        .await
        .map_err(error::backend)?;
    info!(table_id = %id, "Table deleted");

    state.cache().write().await.remove_table(&id);
    state.ws_broadcaster().tables_changed();

    Ok(StatusCode::NO_CONTENT)
}

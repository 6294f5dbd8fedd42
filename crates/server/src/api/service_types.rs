//! Service type API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use turnos_core::{
    active_service_types, CreateServiceTypeRequest, ServiceType, UpdateServiceTypeRequest,
};

use super::error::{self, ApiError};
use crate::state::AppState;

/// Query parameters for listing service types
#[derive(Debug, Deserialize)]
pub struct ListServiceTypesParams {
    /// Only the ones offered when issuing tickets
    #[serde(default)]
    pub active: bool,
}

pub async fn list_service_types(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListServiceTypesParams>,
) -> Json<Vec<ServiceType>> {
    let cache = state.cache().read().await;
    if params.active {
        return Json(active_service_types(cache.service_types()));
    }
    let mut all = cache.service_types().to_vec();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    Json(all)
}

pub async fn create_service_type(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateServiceTypeRequest>,
) -> Result<(StatusCode, Json<ServiceType>), ApiError> {
    let request = body.normalized();
    request.validate().map_err(error::validation)?;

    let service_type = state
        .backend()
        .create_service_type(&request)
        .await
        .map_err(error::backend)?;
    info!(service_type_id = %service_type.id, code = %service_type.code, "Service type created");

    state
        .cache()
        .write()
        .await
        .upsert_service_type(service_type.clone());
    state.ws_broadcaster().service_types_changed();

    Ok((StatusCode::CREATED, Json(service_type)))
}

pub async fn update_service_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceTypeRequest>,
) -> Result<Json<ServiceType>, ApiError> {
    let request = body.normalized();
    request.validate().map_err(error::validation)?;

    let service_type = state
        .backend()
        .update_service_type(&id, &request)
        .await
        .map_err(error::backend)?;

    state
        .cache()
        .write()
        .await
        .upsert_service_type(service_type.clone());
    state.ws_broadcaster().service_types_changed();

    Ok(Json(service_type))
}

pub async fn delete_service_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .backend()
        .delete_service_type(&id)
        .await
        .map_err(error::backend)?;
    info!(service_type_id = %id, "Service type deleted");

    state.cache().write().await.remove_service_type(&id);
    state.ws_broadcaster().service_types_changed();

    Ok(StatusCode::NO_CONTENT)
}

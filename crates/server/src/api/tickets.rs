//! Ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use turnos_core::{
    metrics::TICKET_TRANSITIONS, order_for_operator_list, CreateTicketRequest, QueueStats, Ticket,
    TicketStatus, Transition,
};

use super::error::{self, ApiError};
use crate::metrics::TICKETS_CREATED_TOTAL;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    /// Filter by status (waiting, serving, completed, cancelled)
    pub status: Option<String>,
}

/// Request body for calling a ticket
#[derive(Debug, Deserialize)]
pub struct CallTicketBody {
    pub table_id: String,
}

/// Request body for completing or cancelling a ticket
#[derive(Debug, Default, Deserialize)]
pub struct NotesBody {
    pub notes: Option<String>,
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
    pub total: usize,
}

/// Response for queue counters
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub today: QueueStats,
    pub overall: QueueStats,
}

// ============================================================================
// Handlers
// ============================================================================

/// List cached tickets in operator order (newest first)
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<TicketStatus>()
                .map_err(|e| error::error(StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
        None => None,
    };

    let cache = state.cache().read().await;
    let tickets = order_for_operator_list(&cache.tickets_with_status(status));

    Ok(Json(ListTicketsResponse {
        total: tickets.len(),
        tickets,
    }))
}

/// Get a cached ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let cache = state.cache().read().await;
    cache
        .ticket(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error::not_found("Ticket", &id))
}

/// Issue a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let request = body.normalized();
    request.validate().map_err(error::validation)?;

    let ticket = state
        .backend()
        .create_ticket(&request)
        .await
        .map_err(error::backend)?;

    info!(ticket_id = %ticket.id, code = %ticket.code, "Ticket issued");
    TICKETS_CREATED_TOTAL.inc();

    state.cache().write().await.insert_ticket(ticket.clone());
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status);

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Call a waiting ticket to a table
pub async fn call_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CallTicketBody>,
) -> Result<Json<Ticket>, ApiError> {
    relay_transition(&state, &id, Transition::call(body.table_id)).await
}

/// Finish attending a serving ticket
pub async fn complete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<NotesBody>>,
) -> Result<Json<Ticket>, ApiError> {
    let notes = notes(body);
    relay_transition(&state, &id, Transition::Complete { notes }).await
}

/// Cancel a waiting or serving ticket
pub async fn cancel_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<NotesBody>>,
) -> Result<Json<Ticket>, ApiError> {
    let notes = notes(body);
    relay_transition(&state, &id, Transition::Cancel { notes }).await
}

/// Counters for today (UTC) and for the whole snapshot
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let cache = state.cache().read().await;
    let today = Utc::now().date_naive();
    Json(StatsResponse {
        today: QueueStats::for_day(cache.tickets(), today),
        overall: QueueStats::from_tickets(cache.tickets()),
    })
}

fn notes(body: Option<Json<NotesBody>>) -> Option<String> {
    body.and_then(|Json(b)| b.notes)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Check a transition against the cache, relay it to the backend, then
/// patch the cache with the ticket the backend returns.
async fn relay_transition(
    state: &AppState,
    id: &str,
    transition: Transition,
) -> Result<Json<Ticket>, ApiError> {
    let kind = transition.kind();

    {
        let cache = state.cache().read().await;
        let prepared = cache.prepare_transition(id, transition.clone(), Utc::now());
        let outcome = match prepared {
            Ok(outcome) => outcome,
            Err(e) => {
                TICKET_TRANSITIONS
                    .with_label_values(&[kind.as_str(), "rejected"])
                    .inc();
                return Err(error::cache(e));
            }
        };

        if let Some(ref table_id) = outcome.occupied_table {
            let table = cache.table(table_id).ok_or_else(|| {
                TICKET_TRANSITIONS
                    .with_label_values(&[kind.as_str(), "rejected"])
                    .inc();
                error::not_found("Table", table_id)
            })?;
            if !table.is_callable() {
                TICKET_TRANSITIONS
                    .with_label_values(&[kind.as_str(), "rejected"])
                    .inc();
                return Err(error::error(
                    StatusCode::CONFLICT,
                    format!("Table {} is not available (status: {})", table.number, table.status),
                ));
            }
        }
    }

    let ticket = match state.backend().transition(id, &transition).await {
        Ok(ticket) => ticket,
        Err(e) => {
            warn!(ticket_id = %id, transition = %kind, error = %e, "Backend rejected transition");
            TICKET_TRANSITIONS
                .with_label_values(&[kind.as_str(), "backend_error"])
                .inc();
            return Err(error::backend(e));
        }
    };

    // Another relay on the same ticket may have committed while the backend
    // call was in flight.
    let outcome = state.cache().write().await.reconcile_ticket(ticket);
    TICKET_TRANSITIONS
        .with_label_values(&[kind.as_str(), "applied"])
        .inc();

    let ticket = outcome.ticket;
    info!(ticket_id = %ticket.id, status = %ticket.status, "Ticket transitioned");

    let broadcaster = state.ws_broadcaster();
    broadcaster.ticket_updated(&ticket.id, ticket.status);
    if outcome.occupied_table.is_some() || outcome.released_table.is_some() {
        broadcaster.tables_changed();
    }

    Ok(Json(ticket))
}

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{boards, handlers, middleware::metrics_middleware, service_types, tables, tickets, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and observability
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .route("/refresh", post(handlers::refresh))
        .route("/ws", get(ws::ws_handler))
        // Tickets
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/call", post(tickets::call_ticket))
        .route("/tickets/{id}/complete", post(tickets::complete_ticket))
        .route("/tickets/{id}/cancel", post(tickets::cancel_ticket))
        .route("/stats", get(tickets::get_stats))
        // Tables
        .route("/tables", get(tables::list_tables).post(tables::create_table))
        .route("/tables/callable", get(tables::list_callable_tables))
        .route(
            "/tables/{id}",
            put(tables::update_table).delete(tables::delete_table),
        )
        // Service types
        .route(
            "/service-types",
            get(service_types::list_service_types).post(service_types::create_service_type),
        )
        .route(
            "/service-types/{id}",
            put(service_types::update_service_type).delete(service_types::delete_service_type),
        )
        // Boards
        .route("/boards/waiting", get(boards::get_waiting_board))
        .route("/boards/attention", get(boards::get_attention_board))
        .route("/boards/dashboard", get(boards::get_dashboard))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

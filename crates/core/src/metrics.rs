//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Snapshot refreshes (results, duration)
//! - Ticket transitions
//! - Backend requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Refresh Metrics
// =============================================================================

/// Snapshot refreshes by result.
pub static REFRESHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("turnos_refreshes_total", "Total queue snapshot refreshes"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

/// Snapshot refresh duration in seconds.
pub static REFRESH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "turnos_refresh_duration_seconds",
            "Duration of a full queue snapshot refresh",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Ticket transitions by kind and result.
pub static TICKET_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("turnos_ticket_transitions_total", "Ticket transitions"),
        &["transition", "result"], // result: "applied", "rejected", "backend_error"
    )
    .unwrap()
});

// =============================================================================
// Backend Metrics
// =============================================================================

/// Backend request duration.
pub static BACKEND_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "turnos_backend_request_duration_seconds",
            "Duration of backend REST calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

/// Backend requests total.
pub static BACKEND_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("turnos_backend_requests_total", "Total backend requests"),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Refresh
        Box::new(REFRESHES_TOTAL.clone()),
        Box::new(REFRESH_DURATION.clone()),
        // Tickets
        Box::new(TICKET_TRANSITIONS.clone()),
        // Backend
        Box::new(BACKEND_REQUEST_DURATION.clone()),
        Box::new(BACKEND_REQUESTS.clone()),
    ]
}

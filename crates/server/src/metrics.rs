//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the turnos server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Ticket and table counts (collected dynamically from the cache)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
use turnos_core::{TableStatus, TicketStatus};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "turnos_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("turnos_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "turnos_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "turnos_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "turnos_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("turnos_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "turnos_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics (collected dynamically)
// =============================================================================

/// Cached tickets by status.
pub static TICKETS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("turnos_tickets_by_status", "Current ticket count by status"),
        &["status"],
    )
    .unwrap()
});

/// Cached tables by status.
pub static TABLES_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("turnos_tables_by_status", "Current table count by status"),
        &["status"],
    )
    .unwrap()
});

/// Tickets issued through this server.
pub static TICKETS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "turnos_tickets_created_total",
        "Total tickets issued since startup",
    )
    .unwrap()
});

/// Refresher running state (1 = running, 0 = stopped).
pub static REFRESHER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "turnos_refresher_running",
        "Whether the background refresher is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Seconds since the last successful refresh (-1 if never refreshed).
pub static SNAPSHOT_AGE_SECONDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "turnos_snapshot_age_seconds",
        "Seconds since the queue snapshot was last refreshed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Queue
    registry
        .register(Box::new(TICKETS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(TABLES_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_CREATED_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(REFRESHER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(SNAPSHOT_AGE_SECONDS.clone()))
        .unwrap();

    // Core metrics (refresh, transitions, backend requests)
    for metric in turnos_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the cache and the refresher.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    REFRESHER_RUNNING.set(if state.refresher().is_running() { 1 } else { 0 });

    let cache = state.cache().read().await;

    let age = cache
        .last_refreshed_at()
        .map(|at| (chrono::Utc::now() - at).num_seconds())
        .unwrap_or(-1);
    SNAPSHOT_AGE_SECONDS.set(age);

    for status in TicketStatus::ALL {
        let count = cache.tickets().iter().filter(|t| t.status == status).count();
        TICKETS_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(count as i64);
    }

    for status in [
        TableStatus::Available,
        TableStatus::Occupied,
        TableStatus::Inactive,
    ] {
        let count = cache.tables().iter().filter(|t| t.status == status).count();
        TABLES_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(count as i64);
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

/// Path segments that are fixed route names rather than ids.
const ROUTE_SEGMENTS: &[&str] = &[
    "api",
    "v1",
    "health",
    "config",
    "metrics",
    "refresh",
    "ws",
    "tickets",
    "call",
    "complete",
    "cancel",
    "stats",
    "tables",
    "callable",
    "service-types",
    "boards",
    "waiting",
    "attention",
    "dashboard",
];

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");

    // Backend ids are not always UUIDs; anything that is not a known route
    // segment is an id.
    result
        .split('/')
        .map(|segment| {
            if segment.is_empty() || segment == "{id}" || ROUTE_SEGMENTS.contains(&segment) {
                segment
            } else {
                "{id}"
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/tickets/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/tickets/{id}");
    }

    #[test]
    fn test_normalize_path_uuid_with_action() {
        let path = "/api/v1/tickets/550e8400-e29b-41d4-a716-446655440000/call";
        assert_eq!(normalize_path(path), "/api/v1/tickets/{id}/call");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/tables/12345";
        assert_eq!(normalize_path(path), "/api/v1/tables/{id}");
    }

    #[test]
    fn test_normalize_path_opaque_id() {
        let path = "/api/v1/service-types/caja-principal";
        assert_eq!(normalize_path(path), "/api/v1/service-types/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/tables/callable"),
            "/api/v1/tables/callable"
        );
        assert_eq!(
            normalize_path("/api/v1/boards/attention"),
            "/api/v1/boards/attention"
        );
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("turnos_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch all metrics to ensure they appear in output
        // (Prometheus only outputs metrics that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        WS_CONNECTIONS_ACTIVE.set(0);
        WS_CONNECTIONS_TOTAL.inc();
        TICKETS_BY_STATUS.with_label_values(&["waiting"]).set(0);
        TABLES_BY_STATUS.with_label_values(&["available"]).set(0);
        TICKETS_CREATED_TOTAL.inc();
        REFRESHER_RUNNING.set(0);
        turnos_core::metrics::REFRESHES_TOTAL
            .with_label_values(&["success"])
            .inc();

        let output = encode_metrics();

        // HTTP metrics
        assert!(output.contains("turnos_http_request_duration_seconds"));
        assert!(output.contains("turnos_http_requests_total"));
        assert!(output.contains("turnos_http_requests_in_flight"));

        // WebSocket metrics
        assert!(output.contains("turnos_ws_connections_active"));
        assert!(output.contains("turnos_ws_connections_total"));

        // Queue metrics
        assert!(output.contains("turnos_tickets_by_status"));
        assert!(output.contains("turnos_tables_by_status"));
        assert!(output.contains("turnos_tickets_created_total"));
        assert!(output.contains("turnos_refresher_running"));

        // Core metrics
        assert!(output.contains("turnos_refreshes_total"));
    }
}

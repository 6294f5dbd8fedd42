//! Common test utilities for in-process API testing with a mock backend.
//!
//! This module provides a test fixture that builds the router around a
//! `MockBackend`, so the API can be exercised without a real backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use turnos_core::{
    testing::MockBackend, Backend, BackendConfig, BoardLimits, Config, QueueCache,
    QueueRefresher, RefreshConfig, ServerConfig, ServiceType,
};
use turnos_server::api::WsBroadcaster;
use turnos_server::state::AppState;

/// Re-export fixtures for test convenience
pub use turnos_core::testing::fixtures;

/// Test fixture for API testing with a mock backend.
///
/// The backend is seeded with two service types and three tables (`m1`,
/// `m2`, `m3`); the cache is loaded once at startup. The background
/// refresher is never started, so the cache only changes through the API
/// or an explicit `refresh()`.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ticket_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/tickets", json!({
///         "service_type_id": fixture.caja.id,
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend - seed data, inject failures, inspect calls
    pub backend: Arc<MockBackend>,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    pub caja: ServiceType,
    pub plataforma: ServiceType,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default board limits.
    pub async fn new() -> Self {
        Self::with_limits(BoardLimits::default()).await
    }

    /// Create a test fixture with custom board limits.
    pub async fn with_limits(boards: BoardLimits) -> Self {
        let backend = Arc::new(MockBackend::new());
        let caja = fixtures::service_type("Caja", "CAJ");
        let plataforma = fixtures::service_type("Plataforma", "PLA");
        backend
            .set_service_types(vec![caja.clone(), plataforma.clone()])
            .await;
        backend
            .set_tables(vec![
                fixtures::table("m1", 1),
                fixtures::table("m2", 2),
                fixtures::table("m3", 3),
            ])
            .await;

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            backend: BackendConfig {
                url: "http://backend.test/api".to_string(),
                timeout_secs: 5,
            },
            refresh: RefreshConfig {
                enabled: false,
                interval_ms: 5000,
            },
            boards,
        };

        let refresher = QueueRefresher::new(
            config.refresh.clone(),
            Arc::clone(&backend) as Arc<dyn Backend>,
            Arc::new(RwLock::new(QueueCache::new())),
        );

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&backend) as Arc<dyn Backend>,
            refresher,
            WsBroadcaster::default(),
        ));
        state
            .refresher()
            .refresh_once()
            .await
            .expect("Initial refresh failed");

        let router = turnos_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            backend,
            state,
            caja,
            plataforma,
        }
    }

    /// Reload the cache from the mock backend.
    pub async fn refresh(&self) {
        self.state
            .refresher()
            .refresh_once()
            .await
            .expect("Refresh failed");
    }

    /// Issue a ticket through the API and return its id.
    pub async fn issue(&self, service: &ServiceType, priority: bool) -> String {
        let response = self
            .post(
                "/api/v1/tickets",
                serde_json::json!({
                    "service_type_id": service.id,
                    "is_priority": priority,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"]
            .as_str()
            .expect("ticket id missing")
            .to_string()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}

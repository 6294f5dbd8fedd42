//! Table and service type management tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;

// =============================================================================
// Tables
// =============================================================================

#[tokio::test]
async fn test_list_tables_sorted_by_number() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/tables", json!({ "number": 10, "name": "Mesa diez" }))
        .await;
    assert_status!(response, StatusCode::CREATED);

    let response = fixture.get("/api/v1/tables").await;
    assert_status!(response, StatusCode::OK);
    let numbers: Vec<u64> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 10]);
}

#[tokio::test]
async fn test_create_table_validates_before_backend() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/tables", json!({ "number": 4, "name": "M" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture
        .post("/api/v1/tables", json!({ "number": -1, "name": "Mesa menos uno" }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.backend.call_count("create_table").await, 0);
}

#[tokio::test]
async fn test_duplicate_table_number_is_conflict() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/tables", json!({ "number": 1, "name": "Otra mesa" }))
        .await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "error", json!("Este número de mesa ya está en uso"));
}

#[tokio::test]
async fn test_deactivated_table_is_not_callable() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put("/api/v1/tables/m2", json!({ "active": false }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "active", json!(false));

    let response = fixture.get("/api/v1/tables/callable").await;
    let callable: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(callable, vec!["m1", "m3"]);
}

#[tokio::test]
async fn test_delete_table() {
    let fixture = TestFixture::new().await;

    let response = fixture.delete("/api/v1/tables/m3").await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get("/api/v1/tables").await;
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let response = fixture.delete("/api/v1/tables/m3").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_occupied_table_is_rejected() {
    let fixture = TestFixture::new().await;
    let id = fixture.issue(&fixture.caja, false).await;
    fixture
        .post(
            &format!("/api/v1/tickets/{}/call", id),
            json!({ "table_id": "m1" }),
        )
        .await;

    let response = fixture.delete("/api/v1/tables/m1").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error", json!("No se puede eliminar una mesa ocupada"));
    let response = fixture.get("/api/v1/tables").await;
    assert_eq!(response.body.as_array().unwrap().len(), 3);
}

// =============================================================================
// Service types
// =============================================================================

#[tokio::test]
async fn test_create_service_type_uppercases_code() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/service-types",
            json!({
                "name": "Reclamos",
                "code": " rec ",
                "color": "#EF4444",
                "estimated_duration_minutes": 15
            }),
        )
        .await;

    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "code", json!("REC"));
    assert_json_path!(response.body, "active", json!(true));

    // Tickets can be issued for it right away
    let service_id = response.body["id"].as_str().unwrap().to_string();
    let response = fixture
        .post("/api/v1/tickets", json!({ "service_type_id": service_id }))
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "code", json!("REC-001"));
}

#[tokio::test]
async fn test_create_service_type_rejects_bad_color() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/service-types",
            json!({
                "name": "Reclamos",
                "code": "REC",
                "color": "red",
                "estimated_duration_minutes": 15
            }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().starts_with("color"));
}

#[tokio::test]
async fn test_list_active_service_types() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put(
            &format!("/api/v1/service-types/{}", fixture.plataforma.id),
            json!({ "active": false }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let response = fixture.get("/api/v1/service-types").await;
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let response = fixture.get("/api/v1/service-types?active=true").await;
    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Caja"]);
}

#[tokio::test]
async fn test_delete_service_type_with_active_tickets() {
    let fixture = TestFixture::new().await;
    fixture.issue(&fixture.caja, false).await;

    let response = fixture
        .delete(&format!("/api/v1/service-types/{}", fixture.caja.id))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture
        .delete(&format!("/api/v1/service-types/{}", fixture.plataforma.id))
        .await;
    assert_status!(response, StatusCode::NO_CONTENT);

    let response = fixture.get("/api/v1/service-types").await;
    assert_eq!(response.body.as_array().unwrap().len(), 1);
}

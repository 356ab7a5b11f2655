use axum::{extract::Json, http::StatusCode, routing::post, Router};
use axum_test::TestServer;
use serde_json::{json, Value};

use crate::types::{ErrorResponse, Event};

/// Test handler exercising the decode + validate half of event ingestion
/// without a live producer behind it.
async fn test_ingest_handler(
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let event: Event = match serde_json::from_value(body) {
        Ok(event) => event,
        Err(e) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid event: {}", e),
                }),
            ));
        }
    };

    if let Err(e) = event.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        ));
    }

    Ok(Json(json!({"status": "ok"})))
}

fn create_test_server() -> TestServer {
    let app = Router::new().route("/events", post(test_ingest_handler));
    TestServer::new(app).unwrap()
}

fn valid_event_body() -> Value {
    json!({
        "user_id": 1,
        "item_id": 100,
        "event_type": "VIEW",
        "session_id": "session_1"
    })
}

#[tokio::test]
async fn test_accepts_all_four_event_types() {
    let server = create_test_server();

    for event_type in ["VIEW", "CLICK", "CART", "PURCHASE"] {
        let mut body = valid_event_body();
        body["event_type"] = json!(event_type);

        let response = server.post("/events").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let ok: Value = response.json();
        assert_eq!(ok["status"], "ok");
    }
}

#[tokio::test]
async fn test_rejects_non_positive_user_id() {
    let server = create_test_server();

    for user_id in [0, -1] {
        let mut body = valid_event_body();
        body["user_id"] = json!(user_id);

        let response = server.post("/events").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = response.json();
        assert!(error.error.contains("user_id"));
    }
}

#[tokio::test]
async fn test_rejects_non_positive_item_id() {
    let server = create_test_server();

    let mut body = valid_event_body();
    body["item_id"] = json!(-7);

    let response = server.post("/events").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = response.json();
    assert!(error.error.contains("item_id"));
}

#[tokio::test]
async fn test_rejects_unknown_event_type() {
    let server = create_test_server();

    let mut body = valid_event_body();
    body["event_type"] = json!("HOVER");

    let response = server.post("/events").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let mut body = valid_event_body();
    body["event_type"] = json!("");
    let response = server.post("/events").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejects_missing_event_type() {
    let server = create_test_server();

    let body = json!({"user_id": 1, "item_id": 100, "session_id": "s"});
    let response = server.post("/events").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metadata_and_timestamp_are_optional() {
    let server = create_test_server();

    let mut body = valid_event_body();
    body["metadata"] = json!({"source": "homepage", "position": 3});
    body["timestamp"] = json!("2026-08-01T12:00:00Z");

    let response = server.post("/events").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

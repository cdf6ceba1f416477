//! Integration Tests for the Telemetry Gateway
//!
//! These tests drive both services end to end through their axum routers.
//! The ingestion tests forward to a fake IoTDB REST server bound to a
//! loopback port.
//!
//! # Test Categories
//!
//! 1. **Scoring**: Mean, threshold and defaults over HTTP
//! 2. **Forwarding**: Record shape, headers and backend status relay
//! 3. **Failure Mapping**: Unreachable backend becomes 502
//! 4. **Routing**: Health and not-found behavior

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

use gateway_core::{
    ingestion_router, scoring_router, IngestionHandler, IotdbConfig, ScoringConfig,
    ScoringHandler,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// What the fake backend received.
#[derive(Debug, Clone)]
struct Captured {
    authorization: Option<String>,
    content_type: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeIotdb {
    status: StatusCode,
    reply: &'static str,
    captured: Arc<Mutex<Vec<Captured>>>,
}

async fn fake_insert(
    State(fake): State<FakeIotdb>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    fake.captured.lock().unwrap().push(Captured {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    (fake.status, fake.reply)
}

/// Start a fake IoTDB REST server and return its base URL.
async fn spawn_fake_iotdb(
    status: StatusCode,
    reply: &'static str,
) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeIotdb {
        status,
        reply,
        captured: captured.clone(),
    };

    let app = Router::new()
        .route("/rest/v1/insertRecord", post(fake_insert))
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), captured)
}

/// A loopback URL with nothing listening on it.
async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn adapter(base_url: String, user: &str) -> Router {
    let config = IotdbConfig {
        base_url,
        user: user.to_string(),
        password: "root".to_string(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    ingestion_router(Arc::new(IngestionHandler::from_config(config).unwrap()))
}

fn ainode() -> Router {
    scoring_router(Arc::new(ScoringHandler::new(ScoringConfig {
        model_version: "v3".to_string(),
    })))
}

async fn call(app: Router, method: &str, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn telemetry() -> Value {
    json!({
        "device_id": "root.plant.line1.pump7",
        "timestamp": 1717243200000u64,
        "measurements": ["temperature", "vibration"],
        "values": [68.2, 0.31],
        "data_types": ["FLOAT", "DOUBLE"],
    })
}

// ============================================================================
// SCORING
// ============================================================================

#[tokio::test]
async fn test_scoring_boundary_and_anomaly() {
    let (status, body) = call(ainode(), "POST", "/infer", r#"{"fields":{"a":10,"b":90}}"#.into()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], json!(50.0));
    assert_eq!(body["label"], "normal");

    let (_, body) = call(ainode(), "POST", "/infer", r#"{"fields":{"a":60,"b":80}}"#.into()).await;
    assert_eq!(body["score"], json!(70.0));
    assert_eq!(body["label"], "anomaly");
}

#[tokio::test]
async fn test_scoring_defaults() {
    let (status, body) = call(ainode(), "POST", "/infer", "{}".into()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "device_id": "device-1",
            "timestamp": null,
            "score": 0.0,
            "label": "normal",
            "model_version": "v3",
        })
    );
}

#[tokio::test]
async fn test_scoring_is_idempotent() {
    let payload = r#"{"device_id":"s-9","timestamp":5,"fields":{"x":3,"y":4.5}}"#;

    let first = call(ainode(), "POST", "/infer", payload.into()).await;
    let second = call(ainode(), "POST", "/infer", payload.into()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_malformed_json_rejected_by_both_services() {
    let base_url = unreachable_base_url().await;

    let (status, body) = call(ainode(), "POST", "/infer", "{not json".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid_json"}));

    let (status, body) = call(adapter(base_url, "root"), "POST", "/ingest", "{not json".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid_json"}));
}

// ============================================================================
// FORWARDING
// ============================================================================

#[tokio::test]
async fn test_forward_success_relays_backend_reply() {
    let (base_url, captured) = spawn_fake_iotdb(StatusCode::OK, "ok").await;

    let (status, body) = call(adapter(base_url, "root"), "POST", "/ingest", telemetry().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "forwarded", "iotdb_status": 200, "iotdb_response": "ok"})
    );

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(captured[0].authorization.as_deref(), Some("Basic cm9vdDpyb290"));
    assert_eq!(
        captured[0].body,
        json!({
            "deviceId": "root.plant.line1.pump7",
            "timestamp": 1717243200000u64,
            "measurements": ["temperature", "vibration"],
            "values": [68.2, 0.31],
            "dataTypes": ["FLOAT", "DOUBLE"],
        })
    );
}

#[tokio::test]
async fn test_backend_error_status_is_not_adapter_error() {
    let reply = r#"{"code":500,"message":"storage group not set"}"#;
    let (base_url, _) = spawn_fake_iotdb(StatusCode::INTERNAL_SERVER_ERROR, reply).await;

    let (status, body) = call(adapter(base_url, "root"), "POST", "/ingest", telemetry().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "forwarded");
    assert_eq!(body["iotdb_status"], 500);
    assert_eq!(body["iotdb_response"], reply);
}

#[tokio::test]
async fn test_empty_user_sends_no_authorization() {
    let (base_url, captured) = spawn_fake_iotdb(StatusCode::OK, "ok").await;

    let mut payload = telemetry();
    payload.as_object_mut().unwrap().remove("data_types");

    let (status, _) = call(adapter(base_url, ""), "POST", "/ingest", payload.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let captured = captured.lock().unwrap();
    assert_eq!(captured[0].authorization, None);
    assert!(captured[0].body.get("dataTypes").is_none());
}

#[tokio::test]
async fn test_missing_fields_never_reach_backend() {
    let (base_url, captured) = spawn_fake_iotdb(StatusCode::OK, "ok").await;

    let (status, body) = call(
        adapter(base_url, "root"),
        "POST",
        "/ingest",
        r#"{"device_id":"d1","timestamp":123,"values":[1]}"#.into(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": "missing_fields",
            "required": ["device_id", "timestamp", "measurements", "values"],
        })
    );
    assert!(captured.lock().unwrap().is_empty());
}

// ============================================================================
// FAILURE MAPPING
// ============================================================================

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let base_url = unreachable_base_url().await;

    let (status, body) = call(adapter(base_url, "root"), "POST", "/ingest", telemetry().to_string()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "iotdb_request_failed");
    assert!(!body["details"].as_str().unwrap().is_empty());
}

// ============================================================================
// ROUTING
// ============================================================================

#[tokio::test]
async fn test_health_independent_of_backend() {
    let base_url = unreachable_base_url().await;

    let (status, body) = call(adapter(base_url, "root"), "GET", "/healthz", String::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = call(ainode(), "GET", "/healthz", String::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_adapter_unknown_routes() {
    let base_url = unreachable_base_url().await;

    for (method, uri) in [("GET", "/ingest"), ("POST", "/infer"), ("GET", "/metrics"), ("PUT", "/ingest")] {
        let (status, body) = call(adapter(base_url.clone(), "root"), method, uri, "{}".into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body, json!({"error": "not_found"}));
    }
}

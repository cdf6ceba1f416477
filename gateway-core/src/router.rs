//! HTTP routers for the two gateway services.
//!
//! # Routes
//!
//! | Method | Path | Service |
//! |--------|------|---------|
//! | `GET` | `/healthz` | both |
//! | `POST` | `/infer` | scoring |
//! | `POST` | `/ingest` | ingestion |
//!
//! Anything else, including a wrong method on a known path, answers
//! `404 {"error":"not_found"}`. Request bodies are not size-limited, so a
//! large but valid payload still reaches its handler.
//!
//! # Example
//!
//! ```rust,ignore
//! use gateway_core::{router::scoring_router, ScoringConfig, ScoringHandler};
//! use std::sync::Arc;
//!
//! let app = scoring_router(Arc::new(ScoringHandler::new(ScoringConfig::default())));
//!
//! // Run with axum::serve()
//! ```

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::clients::IotdbError;
use crate::error::GatewayError;
use crate::handlers::{IngestionHandler, ScoringHandler};
use crate::response::JsonResponse;

/// Liveness probe path shared by both services.
pub const HEALTH_PATH: &str = "/healthz";

/// Scoring endpoint path.
pub const INFER_PATH: &str = "/infer";

/// Ingestion endpoint path.
pub const INGEST_PATH: &str = "/ingest";

/// Router for the scoring (ainode) service.
pub fn scoring_router(handler: Arc<ScoringHandler>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler).fallback(not_found_handler))
        .route(INFER_PATH, post(infer_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// Router for the ingestion (iotdb-adapter) service.
pub fn ingestion_router(handler: Arc<IngestionHandler>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler).fallback(not_found_handler))
        .route(INGEST_PATH, post(ingest_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// `GET /healthz`, independent of any other state.
async fn health_handler() -> JsonResponse {
    JsonResponse::healthy()
}

async fn not_found_handler() -> JsonResponse {
    JsonResponse::not_found()
}

async fn infer_handler(State(handler): State<Arc<ScoringHandler>>, body: Bytes) -> JsonResponse {
    handler.handle_infer(&body)
}

/// Forwarding runs in its own task so that a caller hanging up does not
/// cancel an exchange already in flight with IoTDB.
async fn ingest_handler(State(handler): State<Arc<IngestionHandler>>, body: Bytes) -> JsonResponse {
    let task = tokio::spawn(async move { handler.handle_ingest(&body).await });

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Ingestion task aborted");
            GatewayError::from(IotdbError::Request(format!("forwarding task aborted: {e}"))).into()
        }
    }
}

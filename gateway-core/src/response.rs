//! JSON response helper shared by both services.
//!
//! Every response the gateway produces, success or failure, is a JSON body
//! with `Content-Type: application/json` and a `Content-Length` equal to the
//! serialized body's byte length.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};

use crate::error::GatewayError;

/// A status code paired with a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    /// HTTP status
    pub status: StatusCode,

    /// Response body
    pub body: Value,
}

impl JsonResponse {
    /// Create a response with an explicit status.
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// `200 {"status":"ok"}` liveness body.
    pub fn healthy() -> Self {
        Self::ok(json!({ "status": "ok" }))
    }

    /// `404 {"error":"not_found"}`.
    pub fn not_found() -> Self {
        GatewayError::NotFound.into()
    }

    /// Compact serialized body.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.body.to_string().into_bytes()
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        let bytes = self.to_bytes();

        (
            self.status,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
            ],
            bytes,
        )
            .into_response()
    }
}

/// Decode a raw request body as JSON.
///
/// An empty body decodes to `{}`. Invalid UTF-8 and malformed JSON both map
/// to [`GatewayError::InvalidJson`].
pub fn decode_body(raw: &[u8]) -> Result<Value, GatewayError> {
    if raw.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(raw).map_err(GatewayError::InvalidJson)
}

//! Gateway Error Taxonomy
//!
//! Every failure a handler can hit is one of four kinds. Each kind maps to a
//! fixed HTTP status and a JSON envelope of the form
//! `{"error": <kind>, ...context}`. Errors are converted at the handler
//! boundary and never escape to the caller as unhandled faults.
//!
//! | Kind | Status | Context |
//! |------|--------|---------|
//! | `invalid_json` | 400 | none |
//! | `missing_fields` | 400 | `required` |
//! | `iotdb_request_failed` | 502 | `details` |
//! | `not_found` | 404 | none |

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::clients::IotdbError;
use crate::contracts::REQUIRED_FIELDS;
use crate::response::JsonResponse;

/// Errors produced while handling a single gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Body is not valid UTF-8 JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Ingestion payload lacks one or more required top-level keys.
    #[error("missing required fields, expected all of: {}", .required.join(", "))]
    MissingFields {
        /// The full required key set, regardless of which keys were absent.
        required: &'static [&'static str],
    },

    /// The backend could not be reached or its reply could not be read.
    #[error("iotdb request failed: {0}")]
    UpstreamForwarding(#[from] IotdbError),

    /// Unrecognized method or path.
    #[error("not found")]
    NotFound,
}

impl GatewayError {
    /// Build the missing-fields error for the ingestion schema.
    pub fn missing_fields() -> Self {
        Self::MissingFields {
            required: &REQUIRED_FIELDS,
        }
    }

    /// Machine-readable error kind placed in the envelope's `error` key.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::MissingFields { .. } => "missing_fields",
            Self::UpstreamForwarding(_) => "iotdb_request_failed",
            Self::NotFound => "not_found",
        }
    }

    /// HTTP status returned for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::MissingFields { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamForwarding(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Whether the failure was caused by the caller's request.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// JSON error envelope for this error.
    ///
    /// Decode failures deliberately carry no parser detail, only the kind.
    pub fn envelope(&self) -> Value {
        match self {
            Self::MissingFields { required } => json!({
                "error": self.kind(),
                "required": required,
            }),
            Self::UpstreamForwarding(cause) => json!({
                "error": self.kind(),
                "details": cause.to_string(),
            }),
            Self::InvalidJson(_) | Self::NotFound => json!({ "error": self.kind() }),
        }
    }
}

impl From<GatewayError> for JsonResponse {
    fn from(err: GatewayError) -> Self {
        JsonResponse::new(err.status_code(), err.envelope())
    }
}

//! Scoring Handler
//!
//! Reduces a device payload to a single anomaly score.
//!
//! # Endpoint
//!
//! `POST /infer`
//!
//! # Field selection
//!
//! 1. If the payload is an object with an object-valued `fields`, score those.
//! 2. Otherwise score `{"value": payload.value}`, where a missing `value` or a
//!    non-object payload counts as `0`.
//!
//! Only JSON numbers take part in the mean. Booleans, strings, nulls and
//! nested containers are skipped.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "device_id": "device-1",
//!   "timestamp": null,
//!   "score": 70.0,
//!   "label": "anomaly",
//!   "model_version": "v0"
//! }
//! ```

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::contracts::{InferenceResponse, Label, DEFAULT_DEVICE_ID, DEFAULT_MODEL_VERSION};
use crate::error::GatewayError;
use crate::response::{decode_body, JsonResponse};

/// Scoring service configuration, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Reported in every verdict
    pub model_version: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }
}

impl ScoringConfig {
    /// Read `AINODE_MODEL_VERSION`, falling back to `v0`.
    pub fn from_env() -> Self {
        Self {
            model_version: std::env::var("AINODE_MODEL_VERSION")
                .unwrap_or_else(|_| DEFAULT_MODEL_VERSION.to_string()),
        }
    }
}

/// Select the field set to score from a payload.
pub fn extract_fields(payload: &Value) -> Map<String, Value> {
    if let Some(Value::Object(fields)) = payload.get("fields") {
        return fields.clone();
    }

    let value = match payload {
        Value::Object(object) => object.get("value").cloned().unwrap_or_else(|| Value::from(0)),
        _ => Value::from(0),
    };

    let mut fields = Map::new();
    fields.insert("value".to_string(), value);
    fields
}

/// Arithmetic mean of the numeric fields of a payload, `0.0` if none.
pub fn compute_score(payload: &Value) -> f64 {
    let numeric: Vec<f64> = extract_fields(payload)
        .values()
        .filter_map(Value::as_f64)
        .collect();

    if numeric.is_empty() {
        return 0.0;
    }

    let count = numeric.len() as f64;
    let sum: f64 = numeric.iter().sum();
    if sum.is_finite() {
        return sum / count;
    }

    // Sum overflowed. Parsed JSON numbers are finite, so each scaled term
    // and their total stay within f64 range.
    numeric.iter().map(|value| value / count).sum()
}

/// Handler for anomaly scoring requests.
///
/// Stateless apart from its configuration. A verdict is a pure function of
/// the payload and the configured model version.
#[derive(Debug, Clone, Default)]
pub struct ScoringHandler {
    config: ScoringConfig,
}

impl ScoringHandler {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Handle a raw `/infer` body.
    ///
    /// Responds `200` with a verdict for any decodable body and `400` otherwise.
    #[instrument(skip_all, fields(body_len = raw.len()))]
    pub fn handle_infer(&self, raw: &[u8]) -> JsonResponse {
        match self.infer(raw) {
            Ok(verdict) => {
                debug!(score = verdict.score, label = %verdict.label, "Payload scored");
                JsonResponse::ok(verdict.into())
            }
            Err(e) => {
                warn!(error = %e, "Rejected inference request");
                e.into()
            }
        }
    }

    /// Decode and score a raw body.
    pub fn infer(&self, raw: &[u8]) -> Result<InferenceResponse, GatewayError> {
        let payload = decode_body(raw)?;
        Ok(self.score_payload(&payload))
    }

    /// Score an already decoded payload.
    pub fn score_payload(&self, payload: &Value) -> InferenceResponse {
        let score = compute_score(payload);

        let device_id = match payload {
            Value::Object(object) => object
                .get("device_id")
                .cloned()
                .unwrap_or_else(|| Value::from(DEFAULT_DEVICE_ID)),
            _ => Value::from(DEFAULT_DEVICE_ID),
        };

        InferenceResponse {
            device_id,
            timestamp: payload.get("timestamp").cloned().unwrap_or(Value::Null),
            score,
            label: Label::from_score(score),
            model_version: self.config.model_version.clone(),
        }
    }
}

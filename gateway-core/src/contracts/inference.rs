//! Inference Contracts
//!
//! Output of the scoring service. The inbound payload has no fixed schema:
//! `device_id`, `timestamp`, `fields` and `value` are all optional.

use serde_json::{json, Value};
use std::fmt;

/// Device identifier reported when the payload carries none.
pub const DEFAULT_DEVICE_ID: &str = "device-1";

/// Model version reported when none is configured.
pub const DEFAULT_MODEL_VERSION: &str = "v0";

/// Scores strictly above this value are anomalous.
pub const ANOMALY_THRESHOLD: f64 = 50.0;

/// Verdict attached to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Normal,
    Anomaly,
}

impl Label {
    /// Classify a score. The threshold itself is normal.
    pub fn from_score(score: f64) -> Self {
        if score > ANOMALY_THRESHOLD {
            Label::Anomaly
        } else {
            Label::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Anomaly => "anomaly",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring verdict for one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    /// Device identifier, passed through from the payload
    pub device_id: Value,

    /// Opaque timestamp, passed through or `null`
    pub timestamp: Value,

    /// Mean of all numeric fields, `0.0` when there are none
    pub score: f64,

    /// Anomaly verdict for `score`
    pub label: Label,

    /// Configured model version
    pub model_version: String,
}

impl From<InferenceResponse> for Value {
    fn from(response: InferenceResponse) -> Self {
        json!({
            "device_id": response.device_id,
            "timestamp": response.timestamp,
            "score": response.score,
            "label": response.label.as_str(),
            "model_version": response.model_version,
        })
    }
}

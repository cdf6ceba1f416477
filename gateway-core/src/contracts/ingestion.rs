//! Ingestion Contracts
//!
//! Inbound device telemetry, the IoTDB `insertRecord` body it is projected
//! into, and the adapter's success envelope.
//!
//! Field values are never inspected. Shapes and types are the caller's
//! responsibility and are forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::clients::BackendReply;
use crate::error::GatewayError;

/// Top-level keys every ingestion payload must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["device_id", "timestamp", "measurements", "values"];

/// Optional key forwarded as `dataTypes` when present.
pub const DATA_TYPES_FIELD: &str = "data_types";

/// A validated ingestion payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRequest {
    pub device_id: Value,
    pub timestamp: Value,
    pub measurements: Value,
    pub values: Value,
    pub data_types: Option<Value>,
}

impl IngestionRequest {
    /// Take a required key out of a payload already known to contain it.
    fn take(payload: &mut Map<String, Value>, key: &str) -> Value {
        payload.remove(key).unwrap_or(Value::Null)
    }
}

impl TryFrom<Value> for IngestionRequest {
    type Error = GatewayError;

    /// Non-object payloads have no top-level keys and fail as missing fields.
    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut payload) = payload else {
            return Err(GatewayError::missing_fields());
        };

        if !REQUIRED_FIELDS.iter().all(|key| payload.contains_key(*key)) {
            return Err(GatewayError::missing_fields());
        }

        Ok(Self {
            device_id: Self::take(&mut payload, "device_id"),
            timestamp: Self::take(&mut payload, "timestamp"),
            measurements: Self::take(&mut payload, "measurements"),
            values: Self::take(&mut payload, "values"),
            data_types: payload.remove(DATA_TYPES_FIELD),
        })
    }
}

/// IoTDB REST `insertRecord` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRecord {
    pub device_id: Value,
    pub timestamp: Value,
    pub measurements: Value,
    pub values: Value,

    /// Omitted entirely when the payload had no `data_types`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_types: Option<Value>,
}

impl From<IngestionRequest> for BackendRecord {
    fn from(request: IngestionRequest) -> Self {
        Self {
            device_id: request.device_id,
            timestamp: request.timestamp,
            measurements: request.measurements,
            values: request.values,
            data_types: request.data_types,
        }
    }
}

/// Adapter reply after the backend answered.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionResponse {
    /// Always `"forwarded"`
    pub status: String,

    /// HTTP status the backend returned
    pub iotdb_status: u16,

    /// Raw backend body
    pub iotdb_response: String,
}

impl IngestionResponse {
    pub fn forwarded(reply: BackendReply) -> Self {
        Self {
            status: "forwarded".to_string(),
            iotdb_status: reply.status,
            iotdb_response: reply.body,
        }
    }
}

impl From<IngestionResponse> for Value {
    fn from(response: IngestionResponse) -> Self {
        json!({
            "status": response.status,
            "iotdb_status": response.iotdb_status,
            "iotdb_response": response.iotdb_response,
        })
    }
}

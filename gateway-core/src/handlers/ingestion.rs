//! Ingestion Handler
//!
//! Validates device telemetry, projects it into IoTDB's `insertRecord`
//! schema and forwards it.
//!
//! # Endpoint
//!
//! `POST /ingest`
//!
//! # Request Format
//!
//! ```json
//! {
//!   "device_id": "root.edge.d1",
//!   "timestamp": 1700000000000,
//!   "measurements": ["temperature"],
//!   "values": [21.5],
//!   "data_types": ["FLOAT"]
//! }
//! ```
//!
//! # Response Format
//!
//! The adapter answers `200` whenever IoTDB answered at all. Callers must
//! read `iotdb_status` to learn whether the backend accepted the record.
//!
//! ```json
//! {
//!   "status": "forwarded",
//!   "iotdb_status": 200,
//!   "iotdb_response": "{\"code\":200,\"message\":\"SUCCESS_STATUS\"}"
//! }
//! ```

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::clients::{IotdbClient, IotdbConfig, IotdbError, IotdbWriter};
use crate::contracts::{BackendRecord, IngestionRequest, IngestionResponse};
use crate::error::GatewayError;
use crate::response::{decode_body, JsonResponse};

/// Handler for telemetry ingestion requests.
#[derive(Clone)]
pub struct IngestionHandler {
    writer: Arc<dyn IotdbWriter>,
}

impl IngestionHandler {
    /// Create a handler forwarding through the given writer.
    pub fn new(writer: Arc<dyn IotdbWriter>) -> Self {
        Self { writer }
    }

    /// Create a handler backed by the IoTDB REST client.
    pub fn from_config(config: IotdbConfig) -> Result<Self, IotdbError> {
        Ok(Self::new(Arc::new(IotdbClient::new(config)?)))
    }

    /// Handle a raw `/ingest` body.
    #[instrument(skip_all, fields(body_len = raw.len()))]
    pub async fn handle_ingest(&self, raw: &[u8]) -> JsonResponse {
        match self.ingest(raw).await {
            Ok(response) => {
                info!(iotdb_status = response.iotdb_status, "Record forwarded");
                JsonResponse::ok(response.into())
            }
            Err(e) => {
                if e.is_client_error() {
                    warn!(error = %e, "Rejected ingestion request");
                } else {
                    error!(error = %e, "Forwarding to IoTDB failed");
                }
                e.into()
            }
        }
    }

    /// Decode, validate, project and forward a raw body.
    pub async fn ingest(&self, raw: &[u8]) -> Result<IngestionResponse, GatewayError> {
        let payload = decode_body(raw)?;
        let record = BackendRecord::from(IngestionRequest::try_from(payload)?);
        let reply = self.writer.insert_record(&record).await?;

        Ok(IngestionResponse::forwarded(reply))
    }
}

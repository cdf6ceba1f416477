//! Edge Telemetry Gateway Core
//!
//! Request-handling core shared by the gateway's two stateless HTTP
//! services, which sit between field devices and an IoTDB time-series
//! backend.
//!
//! # Services
//!
//! ## ainode (scoring)
//!
//! - **Endpoint**: `POST /infer`
//! - **Purpose**: Reduce a device's numeric fields to a mean score and an
//!   `anomaly`/`normal` label
//!
//! ## iotdb-adapter (ingestion)
//!
//! - **Endpoint**: `POST /ingest`
//! - **Purpose**: Validate telemetry, reshape it into IoTDB's `insertRecord`
//!   body and forward it with HTTP Basic credentials
//!
//! Each request is handled on its own. There is no shared mutable state, no
//! persistence and no retry.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gateway_core::{IngestionHandler, IotdbConfig};
//!
//! let handler = IngestionHandler::from_config(IotdbConfig::from_env())?;
//! let response = handler.handle_ingest(br#"{"device_id":"d1","timestamp":1,"measurements":["t"],"values":[1]}"#).await;
//! assert_eq!(response.status, 200);
//! ```
//!
//! # Modules
//!
//! - [`contracts`]: Request/response shapes and the IoTDB record
//! - [`handlers`]: Scoring and ingestion handlers
//! - [`clients`]: IoTDB REST client
//! - [`router`]: axum routers for both services
//! - [`response`]: JSON response helper
//! - [`error`]: Error taxonomy and envelopes

#![warn(rustdoc::missing_crate_level_docs)]

pub mod clients;
pub mod contracts;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;

// Re-export commonly used types
pub use clients::{basic_auth_header, BackendReply, IotdbClient, IotdbConfig, IotdbError, IotdbWriter};
pub use contracts::{BackendRecord, InferenceResponse, IngestionRequest, IngestionResponse, Label};
pub use error::GatewayError;
pub use handlers::{compute_score, extract_fields, IngestionHandler, ScoringConfig, ScoringHandler};
pub use response::{decode_body, JsonResponse};
pub use router::{ingestion_router, scoring_router};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Request Handlers
//!
//! The two request-handling cores behind the gateway's HTTP surface. Both
//! take raw request bytes and always produce a [`JsonResponse`], so every
//! request is answered, error paths included.
//!
//! - `ScoringHandler`: anomaly scoring for the ainode service
//! - `IngestionHandler`: validation and IoTDB forwarding for the adapter
//!
//! [`JsonResponse`]: crate::response::JsonResponse

pub mod ingestion;
pub mod scoring;

pub use ingestion::*;
pub use scoring::*;

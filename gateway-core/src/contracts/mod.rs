//! Gateway Contracts
//!
//! Request and response shapes for the scoring and ingestion services.
//! Device payloads are loosely typed JSON, so inbound shapes are extracted
//! from a [`serde_json::Value`] rather than deserialized directly.

pub mod inference;
pub mod ingestion;

pub use inference::*;
pub use ingestion::*;

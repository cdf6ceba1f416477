//! External Service Clients
//!
//! Outbound clients used by the gateway handlers. The ingestion service
//! forwards every accepted record to IoTDB's REST API.

pub mod iotdb;

pub use iotdb::*;

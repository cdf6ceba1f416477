//! Configuration for the telemetry gateway services
//!
//! Each service reads its environment once at startup. The resulting structs
//! are immutable and handed to the handlers by value, so handlers never look
//! at the environment themselves.
//!
//! ainode:
//! - AINODE_PORT: listen port (default 8090)
//! - AINODE_MODEL_VERSION: reported model version (default "v0")
//!
//! iotdb-adapter:
//! - IOTDB_ADAPTER_PORT: listen port (default 8089)
//! - IOTDB_REST_URL: IoTDB REST base URL (default "http://iotdb:18080")
//! - IOTDB_INSERT_ENDPOINT: insert path (default "/rest/v1/insertRecord")
//! - IOTDB_USER / IOTDB_PASS: Basic credentials (default "root"/"root")

use gateway_core::{IotdbConfig, ScoringConfig};
use std::env;
use std::net::SocketAddr;
use tracing::warn;

/// Default ainode listen port.
pub const DEFAULT_AINODE_PORT: u16 = 8090;

/// Default iotdb-adapter listen port.
pub const DEFAULT_ADAPTER_PORT: u16 = 8089;

/// Scoring service configuration.
#[derive(Debug, Clone)]
pub struct AinodeConfig {
    /// HTTP server port
    pub port: u16,

    /// Handler configuration
    pub scoring: ScoringConfig,
}

impl AinodeConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Self {
        Self {
            port: port_from_env("AINODE_PORT", DEFAULT_AINODE_PORT),
            scoring: ScoringConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for AinodeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_AINODE_PORT,
            scoring: ScoringConfig::default(),
        }
    }
}

/// Ingestion service configuration.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// HTTP server port
    pub port: u16,

    /// IoTDB client configuration
    pub iotdb: IotdbConfig,
}

impl AdapterConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Self {
        Self {
            port: port_from_env("IOTDB_ADAPTER_PORT", DEFAULT_ADAPTER_PORT),
            iotdb: IotdbConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_ADAPTER_PORT,
            iotdb: IotdbConfig::default(),
        }
    }
}

/// Parse a port variable, keeping the default when unset or unparseable.
fn port_from_env(name: &str, default: u16) -> u16 {
    match env::var(name) {
        Ok(raw) => parse_port(&raw).unwrap_or_else(|| {
            warn!(variable = name, value = %raw, default, "Ignoring unparseable port");
            default
        }),
        Err(_) => default,
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse().ok()
}

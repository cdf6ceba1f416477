//! IoTDB REST Client
//!
//! Forwards `insertRecord` bodies to an Apache IoTDB REST endpoint.
//!
//! Exactly one attempt is made per record. Any HTTP status the backend
//! returns counts as a completed exchange, including 4xx and 5xx. Only
//! transport-level problems surface as [`IotdbError`]: connecting, timing
//! out, or reading the reply as UTF-8 text.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::contracts::BackendRecord;

/// Default IoTDB REST base URL.
pub const DEFAULT_IOTDB_URL: &str = "http://iotdb:18080";

/// Default insert path appended to the base URL.
pub const DEFAULT_INSERT_ENDPOINT: &str = "/rest/v1/insertRecord";

/// Default IoTDB credentials.
pub const DEFAULT_IOTDB_USER: &str = "root";
pub const DEFAULT_IOTDB_PASSWORD: &str = "root";

/// Upper bound on one forwarding exchange.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// IoTDB client configuration.
#[derive(Clone)]
pub struct IotdbConfig {
    /// Base URL, e.g. `http://iotdb:18080`
    pub base_url: String,

    /// Path appended verbatim to `base_url`
    pub insert_endpoint: String,

    /// Basic-auth user. Empty disables the `Authorization` header.
    pub user: String,

    /// Basic-auth password
    pub password: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for IotdbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_IOTDB_URL.to_string(),
            insert_endpoint: DEFAULT_INSERT_ENDPOINT.to_string(),
            user: DEFAULT_IOTDB_USER.to_string(),
            password: DEFAULT_IOTDB_PASSWORD.to_string(),
            timeout: FORWARD_TIMEOUT,
        }
    }
}

impl fmt::Debug for IotdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IotdbConfig")
            .field("base_url", &self.base_url)
            .field("insert_endpoint", &self.insert_endpoint)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IotdbConfig {
    /// Create config from environment variables.
    ///
    /// Reads `IOTDB_REST_URL`, `IOTDB_INSERT_ENDPOINT`, `IOTDB_USER` and
    /// `IOTDB_PASS`. An explicitly empty `IOTDB_USER` turns authentication off.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        Self {
            base_url: var("IOTDB_REST_URL", DEFAULT_IOTDB_URL),
            insert_endpoint: var("IOTDB_INSERT_ENDPOINT", DEFAULT_INSERT_ENDPOINT),
            user: var("IOTDB_USER", DEFAULT_IOTDB_USER),
            password: var("IOTDB_PASS", DEFAULT_IOTDB_PASSWORD),
            ..Default::default()
        }
    }

    /// Full insert URL.
    ///
    /// The endpoint is concatenated onto the base rather than resolved
    /// against it, so a base with its own path prefix keeps that prefix.
    pub fn insert_url(&self) -> Result<Url, IotdbError> {
        let joined = format!("{}{}", self.base_url, self.insert_endpoint);
        Url::parse(&joined)
            .map_err(|e| IotdbError::Configuration(format!("invalid insert URL {joined:?}: {e}")))
    }
}

/// Build the value of an HTTP Basic `Authorization` header.
///
/// Returns `None` when `user` is empty.
pub fn basic_auth_header(user: &str, password: &str) -> Option<String> {
    if user.is_empty() {
        return None;
    }

    let token = STANDARD.encode(format!("{user}:{password}"));
    Some(format!("Basic {token}"))
}

/// Errors from IoTDB forwarding.
#[derive(Debug, Error)]
pub enum IotdbError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("request error: {0}")]
    Request(String),

    #[error("response decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for IotdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IotdbError::Timeout
        } else if err.is_connect() {
            IotdbError::Connection(err.to_string())
        } else if err.is_decode() || err.is_body() {
            IotdbError::Decode(err.to_string())
        } else {
            IotdbError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IotdbError {
    fn from(err: serde_json::Error) -> Self {
        IotdbError::Request(format!("failed to encode record: {err}"))
    }
}

/// Outcome of one completed exchange with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    /// HTTP status code returned by IoTDB
    pub status: u16,

    /// Response body as text
    pub body: String,
}

/// Write path into the time-series backend.
#[async_trait]
pub trait IotdbWriter: Send + Sync {
    /// Insert a single record. One attempt, no retry.
    async fn insert_record(&self, record: &BackendRecord) -> Result<BackendReply, IotdbError>;
}

/// HTTP client implementation for the IoTDB REST API.
#[derive(Clone)]
pub struct IotdbClient {
    client: Client,
    insert_url: Url,
    authorization: Option<HeaderValue>,
}

impl IotdbClient {
    /// Create a new IoTDB client.
    ///
    /// Fails if the insert URL does not parse or the HTTP client cannot be built.
    pub fn new(config: IotdbConfig) -> Result<Self, IotdbError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IotdbError::Configuration(e.to_string()))?;

        let insert_url = config.insert_url()?;

        let authorization = basic_auth_header(&config.user, &config.password)
            .map(|value| {
                HeaderValue::from_str(&value).map(|mut header| {
                    header.set_sensitive(true);
                    header
                })
            })
            .transpose()
            .map_err(|e| IotdbError::Configuration(format!("invalid credentials: {e}")))?;

        Ok(Self {
            client,
            insert_url,
            authorization,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }
}

#[async_trait]
impl IotdbWriter for IotdbClient {
    #[instrument(skip(self, record), fields(url = %self.insert_url))]
    async fn insert_record(&self, record: &BackendRecord) -> Result<BackendReply, IotdbError> {
        let body = serde_json::to_vec(record)?;

        let mut request = self
            .client
            .post(self.insert_url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body);

        if let Some(ref authorization) = self.authorization {
            request = request.header(AUTHORIZATION, authorization.clone());
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "IoTDB request failed");
            IotdbError::from(e)
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| IotdbError::Decode(format!("response body is not UTF-8: {e}")))?;

        debug!(status, body_len = body.len(), "IoTDB responded");

        Ok(BackendReply { status, body })
    }
}

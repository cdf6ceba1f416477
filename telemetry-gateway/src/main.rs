//! Edge Telemetry Gateway
//!
//! Runs one of the gateway's two stateless services, or scores a payload
//! offline.
//!
//! # Service Topology
//!
//! Each service is deployed as its own process:
//! - `telemetry-gateway ainode` serves `/healthz` and `/infer`
//! - `telemetry-gateway iotdb-adapter` serves `/healthz` and `/ingest`
//!
//! # Offline scoring
//!
//! ```bash
//! telemetry-gateway score --input reading.json
//! cat reading.json | telemetry-gateway score --stdin
//! ```

use anyhow::{bail, Context, Result};
use axum::Router;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_core::{ingestion_router, scoring_router, IngestionHandler, ScoringConfig, ScoringHandler};

mod config;

use config::{AdapterConfig, AinodeConfig};

/// Edge telemetry gateway
#[derive(Parser, Debug)]
#[command(name = "telemetry-gateway")]
#[command(version)]
#[command(about = "Edge telemetry gateway services", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "json", env = "GATEWAY_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the anomaly scoring endpoint
    #[command(alias = "scoring")]
    Ainode {
        /// Listen port, overrides AINODE_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve the IoTDB ingestion endpoint
    #[command(alias = "ingestion")]
    IotdbAdapter {
        /// Listen port, overrides IOTDB_ADAPTER_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Score a payload without starting a server
    Score {
        /// Input file path (JSON)
        #[arg(short, long, conflicts_with = "stdin")]
        input: Option<PathBuf>,

        /// Read input from stdin
        #[arg(long)]
        stdin: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    match cli.command {
        Commands::Ainode { port } => serve_ainode(port).await,
        Commands::IotdbAdapter { port } => serve_adapter(port).await,
        Commands::Score { input, stdin } => score_offline(input, stdin),
    }
}

/// Logs go to stderr so `score` output on stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "telemetry_gateway=info,gateway_core=info,tower_http=info".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

async fn serve_ainode(port: Option<u16>) -> Result<()> {
    let mut config = AinodeConfig::load();
    if let Some(port) = port {
        config.port = port;
    }

    info!(
        service = "ainode",
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        model_version = %config.scoring.model_version,
        "Configuration loaded"
    );

    let handler = Arc::new(ScoringHandler::new(config.scoring.clone()));
    serve(scoring_router(handler), config.bind_addr()).await
}

async fn serve_adapter(port: Option<u16>) -> Result<()> {
    let mut config = AdapterConfig::load();
    if let Some(port) = port {
        config.port = port;
    }

    let handler = IngestionHandler::from_config(config.iotdb.clone())
        .context("Failed to create IoTDB client")?;

    info!(
        service = "iotdb-adapter",
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        iotdb_url = %config.iotdb.base_url,
        insert_endpoint = %config.iotdb.insert_endpoint,
        authenticated = !config.iotdb.user.is_empty(),
        "Configuration loaded"
    );

    serve(ingestion_router(Arc::new(handler)), config.bind_addr()).await
}

async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

fn score_offline(input: Option<PathBuf>, stdin: bool) -> Result<()> {
    let raw = match (input, stdin) {
        (Some(path), _) => std::fs::read(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, true) => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
        (None, false) => bail!("Either --input or --stdin is required"),
    };

    let handler = ScoringHandler::new(ScoringConfig::from_env());
    let response = handler.handle_infer(&raw);

    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if !response.status.is_success() {
        bail!("Payload rejected with status {}", response.status);
    }
    Ok(())
}

//! Preview API Server
//!
//! Converts uploaded GeoTIFFs into PNG data-URI previews and EPSG:4326 bounds.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use preview_api::config::load_preview_config;
use preview_api::state::{AppState, DEFAULT_MAX_UPLOAD_MB};

/// Preview API Server
#[derive(Parser, Debug)]
#[command(name = "preview-api")]
#[command(about = "GeoTIFF preview and bounds server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "PREVIEW_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "PREVIEW_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Pipeline config file (YAML)
    #[arg(short, long, env = "PREVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB, env = "PREVIEW_MAX_UPLOAD_MB")]
    max_upload_mb: usize,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting preview API server");

    let config = load_preview_config(args.config.as_deref())?;
    info!(
        downsample_factor = config.downsample_factor,
        max_bands = config.max_bands,
        black_threshold = config.black_threshold,
        optimize_encoding = config.optimize_encoding,
        normalization = ?config.normalization,
        "Pipeline configured"
    );

    let state = Arc::new(
        AppState::new(config)
            .with_max_upload_mb(args.max_upload_mb)
            .with_prometheus(prometheus_handle),
    );

    let app = preview_api::app(state);

    // Parse listen address
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Preview API listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}

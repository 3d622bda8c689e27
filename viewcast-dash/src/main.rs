//! viewcast-dash - view-count prediction dashboard
//!
//! Loads the model artifact and reference dataset once, then serves the
//! dashboard UI and JSON API until Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use viewcast_common::config::{self, CliOverrides, Settings};
use viewcast_common::dataset::ReferenceDataset;
use viewcast_common::ModelArtifact;
use viewcast_dash::services::YouTubeClient;
use viewcast_dash::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "viewcast-dash")]
#[command(about = "View-count prediction dashboard")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "VIEWCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Model artifact (JSON)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Reference dataset (CSV)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Video platform API key for live statistics
    #[arg(long)]
    api_key: Option<String>,

    /// Live lookup timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            model_path: args.model,
            dataset_path: args.dataset,
            api_key: args.api_key,
            request_timeout_secs: args.timeout,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();

    let config_path = config::config_file_path(args.config.take().as_deref());
    let toml_config = config::load_toml_config(config_path.as_deref())?;
    let settings = Settings::resolve(args.into(), toml_config)?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(default_filter(&settings.log_level))
            }),
        )
        .init();

    info!(
        "Starting ViewCast dashboard (viewcast-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using environment and defaults"),
    }

    let model = match ModelArtifact::load(&settings.model_path) {
        Ok(model) => model,
        Err(e) => {
            error!("Cannot start without a model: {}", e);
            return Err(e).context("Failed to load model artifact");
        }
    };

    let stats_client = YouTubeClient::new(settings.api_key.clone(), settings.request_timeout)
        .context("Failed to build live statistics client")?;
    if !stats_client.has_api_key() {
        warn!("No API key configured; live lookups will fail with UPSTREAM_AUTH_FAILED");
    }

    let mut state = AppState::new(Arc::new(model), Arc::new(stats_client))
        .with_max_upload_bytes(settings.max_upload_bytes);

    info!(
        "Video identifier strategies: {}",
        state.extractor.strategy_names().join(" → ")
    );

    match ReferenceDataset::load(&settings.dataset_path) {
        Ok(dataset) => state = state.with_dataset(dataset),
        Err(e) => warn!("Exploratory views disabled: {}", e),
    }

    let app = build_router(state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("viewcast-dash listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Plain levels apply to both crates; anything else is used as a directive
fn default_filter(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("viewcast_dash={0},viewcast_common={0},tower_http=warn", level)
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

//! Iris classifier web server

use anyhow::{Context, Result};
use clap::Parser;
use iris_core::telemetry::init_tracing;
use iris_core::IrisConfig;
use iris_web::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "iris-web")]
#[command(about = "Web form and JSON API for Iris predictions")]
#[command(version)]
struct Cli {
    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Model artifact path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Metrics record path
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Configuration file (defaults to ./iris.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = IrisConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(model) = cli.model {
        config.paths.model = model;
    }
    if let Some(metrics) = cli.metrics {
        config.paths.metrics = metrics;
    }

    init_tracing(&config.logging.level, cli.verbose).map_err(anyhow::Error::msg)?;

    let state = AppState::load(&config.paths.model, &config.paths.metrics)?;
    let app = build_router(Arc::new(state));

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind web listener on {addr}"))?;

    tracing::info!("Iris web UI listening on http://{}", addr);
    tracing::info!("Model artifact: {}", config.paths.model.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("web server terminated unexpectedly")
}

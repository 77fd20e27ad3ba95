//! HTTP server binary for pdf2invoice.
//!
//! A thin shim over the library crate that maps CLI flags (each with an
//! environment-variable override) to an `ExtractionConfig`, probes the
//! model endpoint, and serves the axum router until ctrl-c.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2invoice::{app, AppState, ExtractionConfig, OllamaClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pdf2invoice",
    version,
    about = "Structured invoice extraction service backed by a local vision model"
)]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Rendering DPI for page rasterisation (clamped to 72–400).
    #[arg(long, env = "PDF2INVOICE_DPI", default_value_t = 150)]
    dpi: u32,

    /// Maximum pages per model call.
    #[arg(long, env = "PDF2INVOICE_BATCH_SIZE", default_value_t = 6)]
    batch_size: usize,

    /// Vision model identifier.
    #[arg(long, env = "PDF2INVOICE_MODEL", default_value = "llama3.2-vision")]
    model: String,

    /// Base URL of the Ollama-style inference endpoint.
    #[arg(long, env = "PDF2INVOICE_ENDPOINT", default_value = "http://127.0.0.1:11434")]
    endpoint: String,

    /// Per-model-call timeout in seconds.
    #[arg(long, env = "PDF2INVOICE_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .max_batch_size(cli.batch_size)
        .model(cli.model.clone())
        .endpoint(cli.endpoint.clone())
        .model_timeout_secs(cli.timeout_secs)
        .build()
        .context("invalid configuration")?;

    let client = OllamaClient::new(&config).context("building model client")?;

    // Startup probe: log if the endpoint is unreachable, but come up anyway —
    // the model service may start later.
    let probe = client.clone();
    let endpoint = config.endpoint.clone();
    tokio::spawn(async move {
        if probe.probe().await {
            info!(%endpoint, "model endpoint is reachable");
        } else {
            warn!(
                %endpoint,
                "model endpoint did not answer; extraction requests will fail until it is up"
            );
        }
    });

    let state = AppState {
        config: Arc::new(config),
        model: Arc::new(client),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port))
        .await
        .with_context(|| format!("binding port {}", cli.port))?;
    info!(port = cli.port, model = %cli.model, "pdf2invoice listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install ctrl-c handler; shutting down on task end");
    }
}

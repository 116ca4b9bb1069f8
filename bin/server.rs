// Bills Dashboard - Web Server
// JSON views and CSV export over the bills API collection

use anyhow::{Context, Result};
use bill_dashboard::server::{router, AppState};
use bill_dashboard::source::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use bill_dashboard::{ApiClient, ClientConfig, Dashboard};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "bill-server", version, about = "HTTP views over the Virginia bills collection")]
struct Args {
    /// Base URL of the bills API
    #[arg(long, env = "BILLS_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// More output per occurrence (warn, info, debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    // The upstream client is blocking, so load before the runtime starts
    let client = ApiClient::new(ClientConfig {
        base_url: args.api_url.clone(),
        timeout: Duration::from_secs(args.timeout),
    })?;

    let mut dashboard = Dashboard::default();
    match dashboard.load_from(&client) {
        Ok(report) => tracing::info!(loaded = report.loaded, skipped = report.skipped, "initial load"),
        Err(err) => tracing::error!(error = %err, api_url = %args.api_url, "initial load failed; serving an empty collection"),
    }

    let state = AppState::new(dashboard, Arc::new(client));

    let runtime = tokio::runtime::Runtime::new().context("could not start the async runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(args.bind)
            .await
            .with_context(|| format!("could not bind {}", args.bind))?;

        tracing::info!(addr = %args.bind, "serving");
        tracing::info!("  GET  /api/health");
        tracing::info!("  GET  /api/view");
        tracing::info!("  GET  /api/export.csv");
        tracing::info!("  POST /api/refresh");

        axum::serve(listener, router(state)).await?;
        Ok(())
    })
}

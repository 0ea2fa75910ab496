//! Pinchwire relay
//!
//! Receives control lines from the tracker process and serves the latest
//! mode and drag position over HTTP.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pinchwire::{
    config::Config,
    relay::{routes::create_router, ChannelListener, RelayState},
};

/// Pinchwire relay - expose tracker output over HTTP
#[derive(Parser, Debug)]
#[command(name = "pinchwire-relay", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Port the tracker connects to (overrides config)
    #[arg(long)]
    listen_port: Option<u16>,

    /// HTTP server port (overrides config)
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {}-relay v{}", pinchwire::NAME, pinchwire::VERSION);

    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(port) = args.listen_port {
        config.relay.listen_port = port;
    }
    if let Some(port) = args.http_port {
        config.relay.http_port = port;
    }

    config.validate()?;
    let relay_config = config.relay;

    let state = RelayState::new();

    let listen_addr = format!("{}:{}", relay_config.listen_address, relay_config.listen_port);
    let listener = ChannelListener::bind(&listen_addr, Arc::clone(&state)).await?;
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("Channel listener error: {}", e);
        }
    });

    let http_state = Arc::clone(&state);
    let http_handle = tokio::spawn(async move {
        if let Err(e) = run_http_server(http_state, relay_config).await {
            error!("HTTP server error: {}", e);
        }
    });

    shutdown_signal().await;
    info!("Shutdown signal received");
    state.shutdown();

    let _ = listener_handle.await;
    let _ = http_handle.await;

    info!("Relay stopped");
    Ok(())
}

async fn run_http_server(
    state: Arc<RelayState>,
    config: pinchwire::config::RelayConfig,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.http_host, config.http_port);
    let app = create_router(Arc::clone(&state), &config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    let mut shutdown_rx = state.subscribe_shutdown();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

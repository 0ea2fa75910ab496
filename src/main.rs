//! Pinchwire - Two-handed pinch gesture controller
//!
//! Main entry point for the tracker process.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pinchwire::{
    config::Config,
    driver::FrameLoop,
    output::ChannelSender,
    tracking::{
        mediapipe::HandReceiver,
        subprocess::{check_mediapipe_available, TrackerSubprocess},
    },
    AppState,
};

/// How often the supervisor checks the tracker subprocess
const SUPERVISE_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for tasks to finish after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Pinchwire - classify hand pinches into interaction modes
#[derive(Parser, Debug)]
#[command(name = "pinchwire", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not launch the hand tracker subprocess
    #[arg(long)]
    no_launch: bool,

    /// Consumer host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Consumer port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// UDP port for landmark frames (overrides config)
    #[arg(long)]
    tracker_port: Option<u16>,
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

    info!("Starting {} v{}", pinchwire::NAME, pinchwire::VERSION);

    let config = load_config(&args)?;

    info!("Landmark port: {}", config.tracking.port);
    info!("Consumer: {}", config.channel.address());
    info!(
        "Double-tap window: {:.0} ms, tap threshold: {}",
        config.gesture.double_tap_window_secs * 1000.0,
        config.gesture.tap_threshold
    );

    let state = AppState::new(config.clone());

    // Outbound channel first so no early transition is lost to a missing queue
    let (sender, sender_handle) = ChannelSender::spawn(&config.channel, state.subscribe_shutdown());

    let supervisor_handle = if config.tracking.auto_launch {
        if !check_mediapipe_available() {
            warn!("Python package 'mediapipe' not found, the tracker subprocess will likely fail");
        }
        let sp_state = Arc::clone(&state);
        Some(tokio::spawn(async move {
            if let Err(e) = run_tracker_subprocess(sp_state).await {
                error!("Tracker subprocess error: {}", e);
            }
        }))
    } else {
        info!("Tracker auto-launch disabled, expecting frames from an external tracker");
        None
    };

    let mut receiver = HandReceiver::new(&config.tracking);
    receiver.start()?;

    let frame_loop = FrameLoop::new(receiver, &config);
    let loop_handle = tokio::spawn(frame_loop.run(sender, state.subscribe_shutdown()));

    shutdown_signal().await;
    info!("Shutdown signal received");
    state.shutdown();

    let finished = tokio::time::timeout(SHUTDOWN_GRACE, async {
        match loop_handle.await {
            Ok(frame_loop) => frame_loop.into_source().stop(),
            Err(e) => error!("Frame loop task failed: {}", e),
        }
        if let Err(e) = sender_handle.await {
            error!("Channel sender task failed: {}", e);
        }
        if let Some(handle) = supervisor_handle {
            if let Err(e) = handle.await {
                error!("Tracker supervisor task failed: {}", e);
            }
        }
    })
    .await;

    if finished.is_err() {
        warn!("Tasks did not stop within {:?}", SHUTDOWN_GRACE);
    }

    info!("Pinchwire stopped");
    Ok(())
}

/// Load the config file and apply CLI overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if args.no_launch {
        config.tracking.auto_launch = false;
    }
    if let Some(ref host) = args.host {
        config.channel.host = host.clone();
    }
    if let Some(port) = args.port {
        config.channel.port = port;
    }
    if let Some(port) = args.tracker_port {
        config.tracking.port = port;
    }

    config.validate()?;
    Ok(config)
}

/// Keep the hand tracker subprocess alive until shutdown
async fn run_tracker_subprocess(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await;
    let tracking = config.tracking.clone();
    drop(config);

    let mut shutdown_rx = state.subscribe_shutdown();
    let mut subprocess = TrackerSubprocess::new(&tracking);

    if let Err(e) = subprocess.start() {
        // The user may be running a tracker externally
        error!("Failed to auto-launch hand tracker: {}", e);
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Tracker supervisor shutting down");
                break;
            }
            _ = tokio::time::sleep(SUPERVISE_INTERVAL) => {
                if subprocess.is_running() {
                    continue;
                }

                if !tracking.auto_restart {
                    warn!("Hand tracker is not running and auto_restart is disabled");
                    let _ = shutdown_rx.recv().await;
                    break;
                }

                info!(
                    "Hand tracker not running, restarting in {}s",
                    tracking.restart_delay_secs
                );
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(Duration::from_secs(tracking.restart_delay_secs)) => {}
                }
                if let Err(e) = subprocess.start() {
                    error!("Failed to restart hand tracker: {}", e);
                }
            }
        }
    }

    subprocess.stop().await;
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

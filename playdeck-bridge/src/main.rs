//! PlayDeck simulator (playdeck-sim) - Main entry point
//!
//! Runs a scripted session against the simulated engine: controls issue
//! requests before the engine exists, the engine connects and loads a
//! source, playback advances, and every notification the controller
//! broadcasts is printed to stdout as one JSON object per line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{Stream, StreamExt};
use playdeck_bridge::sim::{AutoplayPolicy, SimulatedAdapter};
use playdeck_bridge::{ControllerConfig, PlayerScope, RemoteControl};
use playdeck_common::config::{load_config, LoggingConfig, CONFIG_ENV_VAR};
use playdeck_common::events::{Notification, UserActivity};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "playdeck_bridge=debug,playdeck_common=info";

/// Command-line arguments for playdeck-sim
#[derive(Parser, Debug)]
#[command(name = "playdeck-sim")]
#[command(about = "Scripted playback session against a simulated media engine")]
#[command(version)]
struct Args {
    /// Config file (overrides PLAYDECK_CONFIG and the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source the simulated engine loads
    #[arg(short, long, default_value = "demo.mp4")]
    source: String,

    /// Source duration in seconds
    #[arg(short, long, default_value_t = 30.0)]
    duration: f64,

    /// Playback ticks to simulate (one second each)
    #[arg(long, default_value_t = 5)]
    ticks: u32,

    /// Volume requested before the engine connects
    #[arg(long, default_value_t = 0.8)]
    volume: f64,

    /// Set the autoplay attribute on the engine
    #[arg(long)]
    autoplay: bool,

    /// Reject unmuted playback, like a browser autoplay policy
    #[arg(long)]
    strict_autoplay: bool,

    /// Log filter (overrides the config file; RUST_LOG overrides both)
    #[arg(long, env = "PLAYDECK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging exists so its [logging] section applies
    let config = load_config(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to load configuration")?;
    init_tracing(&config.logging, args.log_level.as_deref())?;

    let controller_config = ControllerConfig::from(&config.bridge);
    info!(?controller_config, "Starting PlayDeck simulator");

    let scope = PlayerScope::new(controller_config.clone());
    let printer = tokio::spawn(print_notifications(scope.notification_stream()));

    // Controls mount before the engine: this request waits in the queue
    let remote = RemoteControl::new();
    let early_volume = remote.change_volume(args.volume);
    remote.attach(scope.clone());

    let policy = if args.strict_autoplay {
        AutoplayPolicy::RequireMuted
    } else {
        AutoplayPolicy::Allow
    };
    let adapter = Arc::new(
        SimulatedAdapter::new("simulated-engine")
            .with_autoplay(args.autoplay)
            .with_policy(policy),
    );
    let connection = scope
        .connect(adapter.clone())
        .context("Failed to connect simulated engine")?;

    early_volume.wait().await.context("Deferred volume change failed")?;
    info!(volume = adapter.volume(), "Deferred volume applied on connect");

    adapter.load(&args.source, args.duration);
    scope.settle().await?;

    if args.autoplay {
        let budget =
            controller_config.autoplay_retry_delay * controller_config.autoplay_max_attempts;
        tokio::time::sleep(budget + Duration::from_millis(50)).await;
        scope.settle().await?;
    } else if let Err(err) = remote.play().wait().await {
        warn!(error = %err, "Play request rejected");
    }
    info!(state = %scope.machine_state(), "Playback started");

    for _ in 0..args.ticks {
        adapter.tick(1.0);
        scope.settle().await?;
    }

    remote
        .seek(args.duration / 2.0)
        .wait()
        .await
        .context("Seek request failed")?;
    let _ = remote.show_controls().wait().await;
    let _ = remote.hide_controls().wait().await;
    remote.pause().wait().await.context("Pause request failed")?;

    scope.report_activity(UserActivity::Pointer);
    tokio::time::sleep(controller_config.idle_timeout + Duration::from_millis(50)).await;
    scope.settle().await?;

    let snapshot = scope.store().snapshot();
    info!(
        state = %scope.machine_state(),
        current_time = snapshot.current_time,
        idle = snapshot.idle,
        "Session finished"
    );
    println!(
        "{}",
        serde_json::to_string(&snapshot).context("Failed to serialize final state")?
    );

    connection.disconnect();
    scope.settle().await?;
    scope.shutdown().await.context("Controller shutdown failed")?;
    printer.abort();

    info!("Simulator shutdown complete");
    Ok(())
}

/// Filter priority: RUST_LOG, then --log-level, then the config file
fn init_tracing(logging: &LoggingConfig, cli_level: Option<&str>) -> Result<()> {
    let fallback = cli_level.unwrap_or(match logging.level.as_str() {
        "" | "info" => DEFAULT_FILTER,
        level => level,
    });
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = logging
        .file
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

async fn print_notifications(stream: impl Stream<Item = Notification> + Send + 'static) {
    tokio::pin!(stream);
    while let Some(notification) = stream.next().await {
        match serde_json::to_string(&notification) {
            Ok(line) => println!("{}", line),
            Err(err) => warn!(
                event = %notification.event_name(),
                error = %err,
                "Unserializable notification"
            ),
        }
    }
}

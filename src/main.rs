use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livewatch::{
    api::AppState,
    config::Config,
    create_router,
    monitor::{Endpoint, MonitorRegistry, MonitorSettings},
    stream::{spawn_folder_player, FrameStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Livewatch");

    // Load configuration
    let config = Config::load()?;
    let settings = MonitorSettings::from_config(&config).context("Invalid monitor settings")?;
    tracing::info!(
        poll_ms = config.poll_interval_ms,
        stale_ms = config.stale_threshold_ms,
        smoothing = config.smoothing_factor,
        "Configuration loaded"
    );

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    // Build application state
    let monitors = MonitorRegistry::new(settings)?;
    let state = AppState::new(monitors.clone()).with_prometheus(prometheus);

    // Frame player feeding the heartbeat and stream endpoints
    let player = spawn_folder_player(
        state.frames.clone(),
        PathBuf::from(&config.frames_dir),
        config.player_fps,
    );

    // Monitors configured at startup
    for (name, url) in config.targets()? {
        match Endpoint::parse(&url) {
            Ok(endpoint) => {
                monitors.insert(&name, endpoint).await?;
            }
            Err(e) => tracing::warn!(monitor = %name, error = %e, "Skipping monitor target"),
        }
    }

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.frames.clone()))
        .await?;

    // Release every monitor timer on the way out
    monitors.clear().await;
    player.abort();
    tracing::info!("Livewatch stopped");

    Ok(())
}

/// Resolves on Ctrl-C after closing the frame store, so open MJPEG streams end
/// and graceful shutdown can complete.
async fn shutdown_signal(frames: FrameStore) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
    frames.close();
}

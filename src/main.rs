//! foyer3d - Interactive 3D Portfolio Avatar Service
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use foyer3d::{config::Config, scene::Stage, web::WebServer, AppState};

/// foyer3d - headless avatar service for an interactive 3D portfolio
#[derive(Parser, Debug)]
#[command(name = "foyer3d", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Avatar model path (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable the HTTP server
    #[arg(long)]
    no_http: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
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

    info!("Starting {} v{}", foyer3d::NAME, foyer3d::VERSION);

    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.avatar.model_path = model;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if args.no_http {
        config.http.enabled = false;
    }

    // Validate configuration
    config.validate()?;

    info!("Avatar model: {}", config.avatar.model_path.display());
    info!("Frame rate: {} Hz", config.frame.rate);
    info!("HTTP server: {}", config.http.enabled);

    // Create shared application state
    let state = AppState::new(config.clone());

    // Start the frame loop
    let frame_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = run_frame_loop(frame_state).await {
            error!("Frame loop error: {}", e);
        }
    });

    // Start HTTP server if enabled
    if config.http.enabled {
        let http_state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = run_http_server(http_state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    // Wait for Ctrl+C / SIGTERM
    shutdown_signal().await;
    info!("Shutdown signal received");
    state.shutdown();

    // Give tasks a moment to clean up
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("foyer3d stopped");
    Ok(())
}

/// Drive the stage at the configured tick rate. Sole writer of the avatar
/// pose state.
async fn run_frame_loop(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await.clone();

    let mut stage = match Stage::from_config(&config) {
        Ok(stage) => stage,
        Err(e) => {
            // The API (LLM/TTS proxies) stays useful without a stage
            error!("Failed to build the avatar stage: {}", e);
            return Ok(());
        }
    };

    let mut shutdown_rx = state.subscribe_shutdown();
    let tick = Duration::from_secs_f32(1.0 / config.frame.rate);
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!("Frame loop started ({} Hz)", config.frame.rate);
    let mut last = tokio::time::Instant::now();

    loop {
        tokio::select! {
            now = interval.tick() => {
                let dt = (now - last).as_secs_f32().min(0.1);
                last = now;

                let (input, orbit_delta, zoom_delta) = state.take_input().await;
                let speaking = state.speech.is_playing();
                let bins = state.speech.frequency_bins();

                let snapshot = stage.advance(dt, &input, orbit_delta, zoom_delta, speaking, bins);
                state.update_avatar_state(snapshot).await;
            }
            _ = state.wait_config_changed() => {
                let config = state.config.read().await.clone();
                stage.apply_tuning(&config);
                info!("Stage tuning reloaded");
            }
            _ = shutdown_rx.recv() => {
                info!("Frame loop shutting down");
                return Ok(());
            }
        }
    }
}

async fn run_http_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let http_config = state.config.read().await.http.clone();

    let web_server = WebServer::new(Arc::clone(&state), &http_config);
    let app = web_server.router();

    let addr = format!("{}:{}", http_config.host, http_config.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| foyer3d::error::WebError::Bind(format!("{addr}: {e}")))?;

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

//! Presence light HTTP server binary.
//!
//! Wires configuration, display backend, status controller and the axum
//! server together, then brings the light into its configured startup mode.
//!
//! ## Usage
//! ```sh
//! ./target/release/presence-light --port 5000
//! ```

use clap::Parser;
use presence_light::color;
use presence_light::config::{Config, StartupMode};
use presence_light::controller::StatusController;
use presence_light::sensor::CpuTempSensor;
use presence_light::server::{self, AppState};
use presence_light::surface;
use presence_light::webhook::{Notifier, NullNotifier, WebhookNotifier};
use std::sync::Arc;

/// Presence status light HTTP server
#[derive(Parser)]
#[command(name = "presence-light")]
#[command(about = "HTTP API server driving a presence status light")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the PORT environment variable)
    #[arg(long)]
    port: Option<u16>,

    /// Force a display backend (mock, phat, mini) instead of probing
    #[arg(long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for request logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let port = args.port.unwrap_or(config.port);

    let surface = surface::shared(surface::detect(args.backend.as_deref()));

    let notifier: Arc<dyn Notifier> =
        match WebhookNotifier::new(config.webhooks.clone(), tokio::runtime::Handle::current()) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                tracing::warn!("webhook client unavailable, notifications disabled: {e}");
                Arc::new(NullNotifier)
            }
        };

    let controller = Arc::new(StatusController::new(
        surface,
        notifier,
        CpuTempSensor::new(),
    ));

    let snapshot = controller.snapshot();
    tracing::info!("Presence Light v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Display: {}x{} ({})",
        snapshot.width,
        snapshot.height,
        snapshot.unicorn
    );
    tracing::info!("Port: {}", port);

    // Switch the light off before exiting so it doesn't stay lit forever.
    let shutdown = controller.clone();
    ctrlc::set_handler(move || {
        shutdown.switch_off("/api/off");
        std::process::exit(0);
    })
    .expect("Error setting Ctrl-C handler");

    apply_startup_mode(&controller, config.startup_mode);

    let app = server::create_router(AppState { controller });

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on http://{addr}");
    tracing::info!("API Documentation: http://localhost:{port}/docs");
    tracing::info!("Try: curl http://localhost:{port}/api/status");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Run the server — this blocks until the process is killed
    axum::serve(listener, app).await.expect("Server error");
}

/// Bring the display into the configured startup mode by invoking the
/// matching controller operation exactly once.
fn apply_startup_mode(controller: &StatusController, mode: StartupMode) {
    tracing::info!("Starting up in {mode:?} mode");
    match mode {
        StartupMode::Off => controller.switch_off("/api/off"),
        StartupMode::Available => {
            controller.set_status(color::AVAILABLE, None, None, true, "/api/available");
        }
        StartupMode::Busy => {
            controller.set_status(color::BUSY, None, None, true, "/api/busy");
        }
        StartupMode::Away => {
            controller.set_status(color::AWAY, None, None, true, "/api/away");
        }
        // the startup rainbow runs brighter and slower than the
        // /api/rainbow defaults
        StartupMode::Rainbow => controller.set_rainbow(Some(1.0), Some(0.1), "/api/rainbow"),
    }
}

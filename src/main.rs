mod models;
mod handlers;
mod routes;
mod docs;
mod config;
mod services;
mod state;
mod utils;
mod websocket;
mod ws;

use std::sync::Arc;
use routes::create_app;
use config::Config;
use services::document_file::DocumentFile;
use state::AppState;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use std::panic;

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Configuration is read before tracing so LOG_LEVEL can shape the filter
    let loaded = Config::load();
    let log_level = loaded.as_ref().map(|c| c.log_level.clone()).unwrap_or_else(|_| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to the configured level, but allow debug for our app
            format!("collab_editor=debug,tower_http=debug,axum::rejection=trace,{log_level}").into()
        }))
        .init();

    info!("Starting server...");

    let config = loaded.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    // Seed the shared document from its backing file
    let initial_content = DocumentFile::new(config.document_path.clone()).load_or_default().await;
    let address = config.server_address();
    let environment = config.environment.clone();
    let app_state = Arc::new(AppState::new(config, initial_content));
    info!(
        "🔧 Sandbox root {} using {}",
        app_state.sandbox.config().root.display(),
        app_state.sandbox.config().compiler
    );

    let app_routes = create_app(app_state);

    // Start the HTTP/WebSocket server
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            return;
        }
    };

    info!("🚀 Server running on http://{} ({})", address, environment);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app_routes).await {
        error!("Server error: {}", e);
    }
}

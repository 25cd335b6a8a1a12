//! Main Entrypoint for the Revolt Voice Assistant API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the Gemini model provider.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and tearing down sessions on shutdown.

use anyhow::Context;
use revolt_api::{config::Config, router::create_router, state::AppState};
use revolt_core::llm_client::{GeminiProvider, GenerationSettings, ModelProvider};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    if config.uses_demo_key() {
        warn!("Using demo API key. Set a valid GEMINI_API_KEY in the .env file");
        warn!("Get your API key from: https://aistudio.google.com/");
    }

    // --- 3. Initialize the Model Provider ---
    let settings = GenerationSettings {
        model: config.chat_model.clone(),
        ..GenerationSettings::default()
    };
    let model_provider: Arc<dyn ModelProvider> = Arc::new(GeminiProvider::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        settings,
    ));

    let app_state = Arc::new(AppState::new(config.clone(), model_provider));
    let registry = app_state.registry.clone();

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        model = %config.chat_model,
        bind_address = %config.bind_address,
        static_dir = %config.static_dir.display(),
        timeout = ?config.generation_timeout,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Revolt Voice Assistant listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    registry.drain().await;
    info!("Server has shut down.");
    Ok(())
}

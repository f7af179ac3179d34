//! Main Entrypoint for the Yovo API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Building the LLM gateway and the session orchestrator.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use yovo_api::{config::Config, router::create_router, state::AppState};
use yovo_core::{
    gateway::LLMGateway, llm_client::HttpLLMClient, orchestrator::SessionOrchestrator,
};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        return;
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

    match config.llm.resolve_provider() {
        Ok(_) => {
            if let Some(var) = config.missing_api_key_var() {
                warn!("{} is not set. Replies will report a configuration error.", var);
            }
        }
        Err(e) => warn!(error = %e, "Replies will report a configuration error."),
    }

    // --- 3. Initialize Shared Services ---
    let client = HttpLLMClient::new(config.llm.timeout).context("Failed to build HTTP client")?;
    let gateway = LLMGateway::new(config.llm.clone(), Arc::new(client));

    let provider = config.llm.provider.clone();
    let bind_address = config.bind_address;
    let environment = config.environment;
    let config = Arc::new(config);

    let app_state = Arc::new(AppState {
        orchestrator: Arc::new(SessionOrchestrator::new(gateway)),
        config,
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        %provider,
        ?environment,
        %bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::cli::ServerArgs;
use crate::config::initialize_app_state_with_url;
use crate::router::create_router;
use crate::schemas::AppState;

pub async fn serve(args: &ServerArgs) -> Result<()> {
    trace!("Entering serve function");
    info!("Muckr application starting up");
    debug!("Database URL: {}", args.database_url);

    let state = initialize_app_state_with_url(&args.database_url, args.token_expires_in)
        .await
        .inspect_err(|e| error!("Failed to initialize application state: {}", e))?;
    debug!("Application state initialized successfully");

    run_server(state, &args.bind_address).await
}

/// Bind `bind_address` and serve the API until ctrl-c.
pub async fn run_server(state: AppState, bind_address: &str) -> Result<()> {
    let app = create_router(state);
    debug!("Router created successfully");

    trace!("Attempting to bind TCP listener to {}", bind_address);
    let listener = TcpListener::bind(bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind to address {}: {}", bind_address, e))?;

    info!("Muckr API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| error!("Server error: {}", e))?;

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

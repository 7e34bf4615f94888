//! Lapwatch - A state-managed HTTP stopwatch with lap tracking
//! 
//! This is the main entry point for the lapwatch application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use lapwatch::{
    config::Config,
    state::AppState,
    api::create_router,
    tasks::tick_driver_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("lapwatch={},tower_http=info", config.log_level()))
        .init();

    info!("Starting lapwatch server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.tick_interval()));

    // Start the tick driver background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_driver_task(tick_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start  - Start the stopwatch");
    info!("  POST /lap    - Split the current lap");
    info!("  POST /stop   - Stop the stopwatch");
    info!("  POST /resume - Resume a stopped stopwatch");
    info!("  POST /reset  - Clear laps and return to idle");
    info!("  GET  /status - Elapsed time and lap table");
    info!("  GET  /health - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

//! bluecarbon-relay server entry point.
//!
//! Starts the Axum HTTP server with the REST and Server-Sent-Events
//! endpoints.

use tracing_subscriber::EnvFilter;

use bluecarbon_relay::app_state::AppState;
use bluecarbon_relay::config::{LogFormat, RelayConfig};
use bluecarbon_relay::domain::EventBroker;
use bluecarbon_relay::server::{build_app, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        queue_capacity = config.subscriber_queue_capacity,
        "starting bluecarbon-relay"
    );

    // Build domain layer
    let broker = EventBroker::new(config.subscriber_queue_capacity);

    // Build application state
    let app_state = AppState::new(broker, config.stream);

    // Build router
    let app = build_app(app_state.clone(), config.request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

//! verdant-ai - Plant Analysis Microservice
//!
//! Startup sequence: tracing init, configuration resolution (ENV → TOML),
//! an availability probe of the primary ML backend when one is configured,
//! then the axum server.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use verdant_ai::config;
use verdant_ai::services::PrimaryBackendClient;
use verdant_ai::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting verdant-ai (Plant Analysis) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::resolve_config()?;

    // Probe the primary backend once so operators see its availability at
    // startup. Failure is informational only; scans fall back per request.
    if let Some(url) = &config.primary_backend_url {
        let probe =
            PrimaryBackendClient::new(url.clone(), Duration::from_secs(config.request_timeout_secs))?;
        match probe.check_health().await {
            Ok(()) => info!("Primary ML backend reachable at {}", url),
            Err(e) => warn!(
                "Primary ML backend at {} not reachable ({}); scans will fall back",
                url, e
            ),
        }
    }

    let state = AppState::from_config(&config)?;
    let app = verdant_ai::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

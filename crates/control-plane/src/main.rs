// Crowdpulse API server
// Decision: Flexible auth with support for no-auth (dev user) and JWT modes
// Decision: In-memory storage when DATABASE_URL is unset; Postgres otherwise

use anyhow::{Context, Result};
use crowdpulse_control_plane::auth::AuthConfig;
use crowdpulse_control_plane::build_router;
use crowdpulse_control_plane::config::ServerConfig;
use crowdpulse_control_plane::storage::StorageBackend;
use crowdpulse_core::telemetry::{init_telemetry, TelemetryConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Values in .env are defaults; real environment variables win
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - SERVICE_NAME: Service name (default: "crowdpulse-control-plane")
    // - RUST_LOG: Log filter (default: "crowdpulse_control_plane=debug,tower_http=debug")
    // - LOG_FORMAT: "json" for JSON lines
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "crowdpulse" {
        telemetry_config.service_name = "crowdpulse-control-plane".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter =
            Some("crowdpulse_control_plane=debug,tower_http=debug".to_string());
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(telemetry_config);

    tracing::info!("crowdpulse-control-plane starting...");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // Initialize storage
    let db = match &config.database_url {
        Some(url) => {
            let db = StorageBackend::postgres(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database, migrations applied");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    // Load authentication configuration
    let auth_config = AuthConfig::from_env();
    tracing::info!(
        mode = auth_config.mode.as_str(),
        dev_user_id = %auth_config.dev_user_id,
        "Authentication configured"
    );

    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }
    if config.cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS origins configured");
    }
    tracing::info!(
        channel_capacity = config.live_channel_capacity,
        keepalive_secs = config.live_keepalive.as_secs(),
        "Live updates configured"
    );

    let app = build_router(&config, auth_config, Arc::new(db));

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

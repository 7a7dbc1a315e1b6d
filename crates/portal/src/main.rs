// Thesis Portal server
// Decision: PostgreSQL when DATABASE_URL is set, in-memory store otherwise (dev mode)

use anyhow::{Context, Result};
use std::sync::Arc;
use thesis_portal::{build_app, storage::StorageBackend, PortalConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let dotenv_path = dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thesis_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("thesis-portal starting...");
    if let Some(path) = dotenv_path {
        tracing::info!("Loaded .env from {:?}", path);
    }

    let config = PortalConfig::from_env();
    tracing::info!(
        filter_mode = config.route_filter.mode.as_str(),
        protected = ?config.route_filter.protected_prefixes,
        "Edge route filter configured"
    );
    tracing::info!(
        oauth_providers = ?config.auth.oauth_providers(),
        signup = !config.auth.disable_signup,
        staff_emails = config.staff_emails.len(),
        "Authentication configured"
    );
    tracing::info!(
        mime_type = %config.upload.mime_type,
        max_bytes = config.upload.max_bytes,
        "Upload policy configured"
    );
    if config.cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS origins configured");
    }

    // Initialize storage
    let db = match &config.database_url {
        Some(url) => {
            let db = StorageBackend::postgres(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    let app = build_app(&config, Arc::new(db));

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("thesis-portal stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

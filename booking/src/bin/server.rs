//! Coral Island booking site server
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Installs the Prometheus recorder
//! - Connects session storage (Redis when `REDIS_URL` is set)
//! - Serves the site until Ctrl+C, then drains in-flight requests
//!
//! # Usage
//!
//! ```bash
//! CORAL_API_BASE_URL=https://api.example.com/api/v1 \
//! CORAL_API_TOKEN=... \
//! cargo run --bin server
//! ```

use anyhow::Context;
use coral_api::ApiClient;
use coral_booking::metrics::register_business_metrics;
use coral_booking::storage::{KeyValueStorage, MemoryStorage, RedisStorage};
use coral_booking::{build_router, AppState, Config, SessionRegistry};
use coral_core::environment::SystemClock;
use coral_runtime::metrics::install_recorder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle sessions are swept from memory.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coral_booking=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Coral Island booking site...");

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    tracing::info!(
        api = %config.api.base_url,
        site = %config.site.url,
        event_id = config.site.event_id,
        storage = if config.storage.redis_url.is_some() { "redis" } else { "memory" },
        "Configuration loaded"
    );

    // Metrics
    let metrics = install_recorder()?;
    register_business_metrics();

    // Remote API
    let api = Arc::new(ApiClient::new(config.api.client_config())?);

    // Session storage
    let storage: Arc<dyn KeyValueStorage> = match &config.storage.redis_url {
        Some(url) => Arc::new(
            RedisStorage::connect(url, config.storage.session_ttl())
                .await
                .context("failed to connect to Redis")?,
        ),
        None => {
            tracing::warn!("REDIS_URL not set, booking drafts are kept in process memory");
            Arc::new(MemoryStorage::new())
        },
    };

    let sessions = Arc::new(SessionRegistry::new(
        storage,
        api.clone(),
        Arc::new(SystemClock),
        config.storage.session_idle(),
    ));
    let sweeper = sessions.spawn_sweeper(SWEEP_INTERVAL);

    let address = config.bind_address();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let state = AppState::new(config, api, Arc::new(SystemClock), Arc::clone(&sessions))
        .with_metrics(metrics);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "Listening");

    // Ctrl+C starts the drain; in-flight requests get `shutdown_timeout` to finish
    let draining = Arc::new(Notify::new());
    let trigger = draining.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        trigger.notify_one();
    });
    let mut serving = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut serving => result??,
        () = draining.notified() => {
            match tokio::time::timeout(shutdown_timeout, &mut serving).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!(?shutdown_timeout, "Requests still running, aborting");
                    serving.abort();
                },
            }
        },
    }

    sweeper.abort();
    let stuck = sessions.shutdown(Duration::from_secs(5)).await;
    if stuck > 0 {
        tracing::warn!(stuck, "Some booking drafts may not have been saved");
    }
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}

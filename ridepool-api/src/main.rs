use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use ridepool_api::{app, worker, AppState, AuthConfig, Repositories};
use ridepool_core::schedule::DepartureResolver;
use ridepool_core::{Clock, SystemClock};
use ridepool_store::app_config::Config;
use ridepool_store::DbClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridepool_api=debug,ridepool_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Ridepool API on port {}", config.server.port);

    // Storage
    let repos = match &config.database {
        Some(db_config) => {
            let db = DbClient::new(db_config).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Repositories::postgres(&db)
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            Repositories::in_memory()
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let resolver = DepartureResolver::from_offset_minutes(config.sweeper.utc_offset_minutes)?;
    let notifier = repos.notifier();

    let app_state = AppState::new(
        &repos,
        notifier.clone(),
        clock.clone(),
        resolver,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    // Expiry sweeper
    let sweeper = worker::start_expiry_worker(&config.sweeper, &repos, notifier, clock, resolver);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.stop().await;
    }
    tracing::info!("Ridepool API shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

//! EazzyMart grocery backend

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eazzymart::api::{self, AppState};
use eazzymart::config::Config;
use eazzymart::notify::{LogNotifier, NatsNotifier, Notifier};
use eazzymart::services::Sweeper;
use eazzymart::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = Store::connect(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;
    store.migrate().await.context("running migrations")?;

    let notifier: Arc<dyn Notifier> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => {
                tracing::info!(%url, subject = %config.notify_subject, "publishing notifications to NATS");
                Arc::new(NatsNotifier::new(client, config.notify_subject.clone()))
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    };

    let state = AppState::new(store, notifier, &config);
    Sweeper::new(state.orders.clone(), config.sweep_interval, config.auto_deliver_after).spawn();
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("EazzyMart listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}

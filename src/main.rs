//! Storefront Promotions - promotion pricing and synchronization service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_promotions::{
    api::{self, AppState},
    config::AppConfig,
    persistence::FileLocalStore,
    remote::PgRemoteSource,
    MessageRenderer, PromotionStore, Reconciler, SystemClock,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env();

    let local = FileLocalStore::new(&config.data_dir, &config.storage_key);
    tracing::info!(path = %local.path().display(), "promotion slot");
    let store = Arc::new(PromotionStore::open(Arc::new(local), Arc::new(SystemClock)));
    let mut state = AppState::new(store.clone(), MessageRenderer::new(&config.date_format));

    if let Some(url) = &config.database_url {
        let pool = PgPoolOptions::new().max_connections(2).connect_lazy(url)?;
        let remote = PgRemoteSource::new(pool, &config.remote_promotion_id);
        state = state.with_reconciler(Reconciler::new(store, Arc::new(remote)));
    } else {
        tracing::info!("DATABASE_URL not set; remote reconciliation disabled");
    }

    if let Some(url) = &config.nats_url {
        match async_nats::connect(url).await {
            Ok(client) => state = state.with_nats(client),
            Err(e) => tracing::warn!(error = %e, "NATS unavailable; promotion events will not be published"),
        }
    }

    if let (Some(reconciler), true) = (state.reconciler.clone(), config.reconcile_on_start) {
        let handle = reconciler.spawn();
        let publisher = state.clone();
        tokio::spawn(async move {
            if let Ok(outcome) = handle.await {
                tracing::info!(?outcome, "startup reconciliation finished");
            }
            publisher.publish_events().await;
        });
    }

    let app = api::router(state);
    tracing::info!("🚀 Storefront promotions listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}

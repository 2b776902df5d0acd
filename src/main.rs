use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use projection_analyzer::{
    api::{create_router, AppState},
    config::Config,
    db::{self, Cache, PgProjectionStore},
    services::{LlmStatsProvider, ProjectionFeedClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("projection_analyzer=debug,tower_http=debug")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let stats_provider = LlmStatsProvider::new(
        cache.clone(),
        config.stats_api_key.clone(),
        config.stats_api_url.clone(),
        config.stats_model.clone(),
        config.stats_cache_ttl,
    );
    let projection_source = ProjectionFeedClient::new(cache, config.projections_api_url.clone());

    let state = AppState::new(
        Arc::new(PgProjectionStore::new(pool)),
        Arc::new(stats_provider),
        Arc::new(projection_source),
    )
    .with_analysis_settings(config.analysis_concurrency, config.analysis_batch_limit);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(address = %config.bind_addr(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

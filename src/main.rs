use std::sync::Arc;

use anyhow::Result;
use axum::middleware;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use mood_cinema::api::{create_router, AppState};
use mood_cinema::config::Config;
use mood_cinema::db::{
    create_redis_client, Cache, CacheWriterHandle, InMemoryLibraryStore, LibraryStore,
    RedisLibraryStore,
};
use mood_cinema::middleware::{make_span_with_request_id, request_id_middleware};
use mood_cinema::services::providers::TmdbProvider;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mood_cinema=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle, library): (
        Option<Cache>,
        Option<CacheWriterHandle>,
        Arc<dyn LibraryStore>,
    ) = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let (cache, handle) = Cache::new(client.clone()).await;
            tracing::info!("Redis cache and library store enabled");
            (
                Some(cache),
                Some(handle),
                Arc::new(RedisLibraryStore::new(client)) as Arc<dyn LibraryStore>,
            )
        }
        None => {
            tracing::warn!("REDIS_URL not set, caching disabled and libraries kept in memory");
            (
                None,
                None,
                Arc::new(InMemoryLibraryStore::new()) as Arc<dyn LibraryStore>,
            )
        }
    };

    let provider = Arc::new(TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
    ));

    let state = AppState::new(provider, library, config.watch_region.clone());

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
            .layer(CorsLayer::permissive()),
    );

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

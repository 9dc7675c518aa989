use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{Endpoint, TrendingWindow};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Rendered `path?params` of a discover or search call
    Page(String),
    Details(Endpoint, u64),
    Recommendations(Endpoint, u64),
    Trending(TrendingWindow),
    Keyword(u64),
    KeywordSearch(String),
    MultiSearch(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Page(canonical) => write!(f, "page:{}", canonical),
            CacheKey::Details(endpoint, id) => write!(f, "details:{}:{}", endpoint, id),
            CacheKey::Recommendations(endpoint, id) => write!(f, "recs:{}:{}", endpoint, id),
            CacheKey::Trending(window) => write!(f, "trending:{}", window.as_str()),
            CacheKey::Keyword(id) => write!(f, "keyword:{}", id),
            CacheKey::KeywordSearch(text) => write!(f, "kwsearch:{}", text.to_lowercase()),
            CacheKey::MultiSearch(text) => write!(f, "multi:{}", text.to_lowercase()),
        }
    }
}

/// Creates a Redis client for caching and library storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Read-through cache for catalog responses
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache and spawns its background writer
    ///
    /// Writes go through a channel so a slow Redis never delays a response.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    // The channel stays open while any Cache clone lives, so
                    // only drain what is already queued
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss. Connection and decoding failures are errors;
    /// the `cached!` macro downgrades them to misses.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_page() {
        let key = CacheKey::Page("discover/movie?page=1&sort_by=popularity.desc".to_string());
        assert_eq!(
            key.to_string(),
            "page:discover/movie?page=1&sort_by=popularity.desc"
        );
    }

    #[test]
    fn test_cache_key_display_details() {
        assert_eq!(
            CacheKey::Details(Endpoint::Movie, 550).to_string(),
            "details:movie:550"
        );
        assert_eq!(
            CacheKey::Details(Endpoint::Tv, 1399).to_string(),
            "details:tv:1399"
        );
    }

    #[test]
    fn test_cache_key_display_recommendations() {
        let key = CacheKey::Recommendations(Endpoint::Movie, 27205);
        assert_eq!(key.to_string(), "recs:movie:27205");
    }

    #[test]
    fn test_cache_key_display_trending() {
        assert_eq!(
            CacheKey::Trending(TrendingWindow::Week).to_string(),
            "trending:week"
        );
        assert_eq!(
            CacheKey::Trending(TrendingWindow::Day).to_string(),
            "trending:day"
        );
    }

    #[test]
    fn test_cache_key_display_keyword() {
        assert_eq!(CacheKey::Keyword(9715).to_string(), "keyword:9715");
    }

    #[test]
    fn test_cache_key_text_searches_are_lowercased() {
        let key = CacheKey::KeywordSearch("Time Travel".to_string());
        assert_eq!(key.to_string(), "kwsearch:time travel");

        let key = CacheKey::MultiSearch("THE MATRIX".to_string());
        assert_eq!(key.to_string(), "multi:the matrix");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let key = CacheKey::KeywordSearch("nonexistent_key_12345".to_string());
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_in_background_writes_to_cache() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;

        let key = CacheKey::Keyword(424242);
        let value = vec!["item1".to_string(), "item2".to_string()];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}

use redis::AsyncCommands;
use redis::Client;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::UserLibrary;

/// Persistence for per-user library documents
///
/// The store is a plain document store: one JSON document per user, read
/// and written whole. Reading an unknown user yields an empty library.
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    async fn read(&self, user_id: &str) -> AppResult<UserLibrary>;

    async fn write(&self, user_id: &str, library: &UserLibrary) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

fn library_key(user_id: &str) -> String {
    format!("library:{}", user_id)
}

/// Library documents stored as JSON strings in Redis (no expiry)
#[derive(Clone)]
pub struct RedisLibraryStore {
    redis_client: Client,
}

impl RedisLibraryStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

#[async_trait::async_trait]
impl LibraryStore for RedisLibraryStore {
    async fn read(&self, user_id: &str) -> AppResult<UserLibrary> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(library_key(user_id)).await?;

        match stored {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                AppError::Internal(format!("Corrupt library document for {}: {}", user_id, e))
            }),
            None => Ok(UserLibrary::default()),
        }
    }

    async fn write(&self, user_id: &str, library: &UserLibrary) -> AppResult<()> {
        let json = serde_json::to_string(library)
            .map_err(|e| AppError::Internal(format!("Library serialization error: {}", e)))?;
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(library_key(user_id), json).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Process-local store, used without Redis and in tests
#[derive(Default)]
pub struct InMemoryLibraryStore {
    documents: RwLock<HashMap<String, UserLibrary>>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn read(&self, user_id: &str) -> AppResult<UserLibrary> {
        Ok(self
            .documents
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn write(&self, user_id: &str, library: &UserLibrary) -> AppResult<()> {
        self.documents
            .write()
            .await
            .insert(user_id.to_string(), library.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

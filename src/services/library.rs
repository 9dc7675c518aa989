use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::LibraryStore;
use crate::error::{AppError, AppResult};
use crate::models::{LibraryList, Preferences, UserLibrary};

const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRequest {
    pub list: LibraryList,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    /// Whether the id is in the list after the toggle
    pub added: bool,
    pub library: UserLibrary,
}

/// Per-user write locks
///
/// Library updates read the whole document, change it and write it back.
/// Holding the user's lock across that cycle keeps concurrent updates in
/// this process from overwriting each other.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop locks no update is holding or waiting on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// User ids are opaque to the engine but end up inside store keys
pub fn validate_user_id(user_id: &str) -> AppResult<()> {
    let valid = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("Invalid user id: {:?}", user_id)))
    }
}

pub async fn load(store: &dyn LibraryStore, user_id: &str) -> AppResult<UserLibrary> {
    validate_user_id(user_id)?;
    store.read(user_id).await
}

/// Toggles `id` in one of the user's lists and persists the document
pub async fn toggle(
    store: &dyn LibraryStore,
    locks: &UserLocks,
    user_id: &str,
    request: &ToggleRequest,
) -> AppResult<ToggleResponse> {
    validate_user_id(user_id)?;
    let _guard = locks.acquire(user_id).await;
    let mut library = store.read(user_id).await?;
    let added = library.toggle(request.list, request.id);
    store.write(user_id, &library).await?;

    tracing::info!(
        user_id = %user_id,
        list = ?request.list,
        id = request.id,
        added = added,
        store = store.name(),
        "Library toggled"
    );

    Ok(ToggleResponse { added, library })
}

pub async fn update_preferences(
    store: &dyn LibraryStore,
    locks: &UserLocks,
    user_id: &str,
    preferences: Preferences,
) -> AppResult<UserLibrary> {
    validate_user_id(user_id)?;
    let _guard = locks.acquire(user_id).await;
    let mut library = store.read(user_id).await?;
    library.preferences = preferences;
    store.write(user_id, &library).await?;
    Ok(library)
}

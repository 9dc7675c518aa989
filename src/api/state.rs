use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::db::LibraryStore;
use crate::models::CatalogPage;
use crate::services::library::UserLocks;
use crate::services::providers::CatalogProvider;
use crate::services::query_compiler::CompileContext;
use crate::services::surface::DisplaySurface;

/// Upper bound on tracked display surfaces
const MAX_SURFACES: usize = 4096;

pub type ResultsSurface = DisplaySurface<CatalogPage>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CatalogProvider>,
    pub library: Arc<dyn LibraryStore>,
    pub library_locks: Arc<UserLocks>,
    pub inner: Arc<RwLock<AppStateInner>>,
    watch_region: String,
    fixed_today: Option<NaiveDate>,
}

/// Inner state that can be modified
pub struct AppStateInner {
    /// One results surface per client-chosen `x-surface-id`
    pub surfaces: HashMap<String, Arc<ResultsSurface>>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        library: Arc<dyn LibraryStore>,
        watch_region: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            library,
            library_locks: Arc::new(UserLocks::new()),
            inner: Arc::new(RwLock::new(AppStateInner {
                surfaces: HashMap::new(),
            })),
            watch_region: watch_region.into(),
            fixed_today: None,
        }
    }

    /// Pins the date used by the query compiler
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn compile_context(&self) -> CompileContext {
        match self.fixed_today {
            Some(today) => CompileContext::new(today, self.watch_region.clone()),
            None => CompileContext::now(self.watch_region.clone()),
        }
    }

    /// Returns the surface registered under `id`, creating it on first use
    pub async fn surface(&self, id: &str) -> Arc<ResultsSurface> {
        if let Some(surface) = self.inner.read().await.surfaces.get(id) {
            return Arc::clone(surface);
        }

        let mut inner = self.inner.write().await;
        if inner.surfaces.len() >= MAX_SURFACES && !inner.surfaces.contains_key(id) {
            // Surfaces with a request in flight are shared and must survive
            let before = inner.surfaces.len();
            inner
                .surfaces
                .retain(|_, surface| Arc::strong_count(surface) > 1);
            tracing::warn!(
                before = before,
                after = inner.surfaces.len(),
                "Surface limit reached, evicting idle surfaces"
            );
        }
        Arc::clone(
            inner
                .surfaces
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(ResultsSurface::new())),
        )
    }
}

//! Catalog data provider abstraction
//!
//! The engine only depends on this trait; the TMDB client is the production
//! implementation and tests plug in doubles.

use std::collections::BTreeMap;

use crate::{
    error::AppResult,
    models::{
        CatalogPage, Endpoint, Keyword, MediaDetails, MediaItem, MultiSearchResult,
        TrendingWindow,
    },
    services::query_compiler::{CatalogRequest, RequestMode},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for media catalog providers
///
/// Covers filtered discovery, text search, per-title lookups and the keyword
/// service. Implementations report transport failures as errors; callers
/// decide how to degrade.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Filtered, paginated listing
    async fn discover(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage>;

    /// Free-text search; `params` carries the `query` parameter
    async fn search(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage>;

    /// Runs a compiled request against the endpoint its mode names
    async fn execute(&self, request: &CatalogRequest) -> AppResult<CatalogPage> {
        match request.mode {
            RequestMode::Discover => self.discover(request.endpoint, &request.params).await,
            RequestMode::Search => self.search(request.endpoint, &request.params).await,
        }
    }

    /// Genres, origin language and runtime of one title
    async fn details(&self, id: u64, endpoint: Endpoint) -> AppResult<MediaDetails>;

    /// Titles related to `id`
    ///
    /// Providers with a separate "similar" listing fall back to it when no
    /// recommendations exist.
    async fn recommendations(&self, id: u64, endpoint: Endpoint) -> AppResult<Vec<MediaItem>>;

    /// Currently trending movies and shows
    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<MediaItem>>;

    /// Resolves free text to keyword ids
    async fn search_keywords(&self, text: &str) -> AppResult<Vec<Keyword>>;

    /// Resolves a keyword id back to its name
    async fn keyword_by_id(&self, id: u64) -> AppResult<Keyword>;

    /// Search across movies, shows and people
    async fn search_multi(
        &self,
        text: &str,
        include_adult: bool,
    ) -> AppResult<Vec<MultiSearchResult>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

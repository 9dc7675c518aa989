#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use mood_cinema::db::{InMemoryLibraryStore, LibraryStore};
use mood_cinema::error::{AppError, AppResult};
use mood_cinema::models::{
    CatalogPage, Endpoint, Genre, Keyword, MediaDetails, MediaItem, MultiMediaType,
    MultiSearchResult, TrendingWindow, UserLibrary,
};
use mood_cinema::services::providers::CatalogProvider;

pub fn item(id: u64, endpoint: Endpoint) -> MediaItem {
    MediaItem {
        id,
        title: format!("Title {}", id),
        media_type: endpoint,
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        release_date: Some("2020-01-01".to_string()),
        vote_average: 7.5,
        genre_ids: Vec::new(),
        adult: false,
        original_language: "en".to_string(),
    }
}

pub struct FakeDetails {
    pub genres: Vec<u32>,
    pub language: String,
    pub delay: Duration,
}

/// Scriptable catalog
///
/// Discovery pages hold two items with ids `page * 100 + 1` and
/// `page * 100 + 2` so tests can tell pages apart.
#[derive(Default)]
pub struct FakeProvider {
    pub requests: Mutex<Vec<(Endpoint, BTreeMap<String, String>)>>,
    pub details: HashMap<u64, FakeDetails>,
    pub keywords: HashMap<u64, String>,
    pub trending: Vec<MediaItem>,
    pub fail_catalog: bool,
    pub fail_endpoint: Option<Endpoint>,
    /// Pages whose discovery sleeps before answering
    pub slow_pages: HashMap<u32, Duration>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_details(mut self, id: u64, genres: &[u32], language: &str) -> Self {
        self.details.insert(
            id,
            FakeDetails {
                genres: genres.to_vec(),
                language: language.to_string(),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_delayed_details(
        mut self,
        id: u64,
        genres: &[u32],
        language: &str,
        delay: Duration,
    ) -> Self {
        self.details.insert(
            id,
            FakeDetails {
                genres: genres.to_vec(),
                language: language.to_string(),
                delay,
            },
        );
        self
    }

    pub fn recorded(&self) -> Vec<(Endpoint, BTreeMap<String, String>)> {
        self.requests.lock().unwrap().clone()
    }

    async fn page(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint, params.clone()));

        if self.fail_catalog || self.fail_endpoint == Some(endpoint) {
            return Err(AppError::ExternalApi("catalog unavailable".to_string()));
        }

        let page: u32 = params
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        if let Some(delay) = self.slow_pages.get(&page) {
            tokio::time::sleep(*delay).await;
        }

        let base = u64::from(page) * 100;
        Ok(CatalogPage {
            items: vec![item(base + 1, endpoint), item(base + 2, endpoint)],
            total_results: 2,
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeProvider {
    async fn discover(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        self.page(endpoint, params).await
    }

    async fn search(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        self.page(endpoint, params).await
    }

    async fn details(&self, id: u64, endpoint: Endpoint) -> AppResult<MediaDetails> {
        let details = self
            .details
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("title {}", id)))?;
        tokio::time::sleep(details.delay).await;
        Ok(MediaDetails {
            id,
            title: format!("Title {}", id),
            media_type: endpoint,
            genres: details
                .genres
                .iter()
                .map(|g| Genre {
                    id: *g,
                    name: format!("Genre {}", g),
                })
                .collect(),
            original_language: details.language.clone(),
            overview: String::new(),
            runtime: Some(120),
        })
    }

    async fn recommendations(&self, id: u64, endpoint: Endpoint) -> AppResult<Vec<MediaItem>> {
        Ok(vec![item(id + 1, endpoint), item(id + 2, endpoint)])
    }

    async fn trending(&self, _window: TrendingWindow) -> AppResult<Vec<MediaItem>> {
        if self.fail_catalog {
            return Err(AppError::ExternalApi("catalog unavailable".to_string()));
        }
        Ok(self.trending.clone())
    }

    async fn search_keywords(&self, text: &str) -> AppResult<Vec<Keyword>> {
        Ok(self
            .keywords
            .iter()
            .filter(|(_, name)| name.contains(text))
            .map(|(id, name)| Keyword {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn keyword_by_id(&self, id: u64) -> AppResult<Keyword> {
        self.keywords
            .get(&id)
            .map(|name| Keyword {
                id,
                name: name.clone(),
            })
            .ok_or_else(|| AppError::NotFound(format!("keyword {}", id)))
    }

    async fn search_multi(
        &self,
        text: &str,
        _include_adult: bool,
    ) -> AppResult<Vec<MultiSearchResult>> {
        if text == "inception" {
            Ok(vec![MultiSearchResult {
                id: 27205,
                media_type: MultiMediaType::Movie,
                title: "Inception".to_string(),
                poster_path: None,
                release_date: Some("2010-07-15".to_string()),
                vote_average: Some(8.4),
                genre_ids: vec![28, 878],
            }])
        } else {
            Ok(Vec::new())
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// In-memory library store whose reads take `delay`
pub struct SlowLibraryStore {
    inner: InMemoryLibraryStore,
    delay: Duration,
}

impl SlowLibraryStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryLibraryStore::new(),
            delay,
        }
    }
}

#[async_trait::async_trait]
impl LibraryStore for SlowLibraryStore {
    async fn read(&self, user_id: &str) -> AppResult<UserLibrary> {
        tokio::time::sleep(self.delay).await;
        self.inner.read(user_id).await
    }

    async fn write(&self, user_id: &str, library: &UserLibrary) -> AppResult<()> {
        self.inner.write(user_id, library).await
    }

    fn name(&self) -> &'static str {
        "slow-memory"
    }
}

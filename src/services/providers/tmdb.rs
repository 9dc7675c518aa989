//! TMDB catalog provider
//!
//! Every call carries the api key and the configured response language.
//! Responses are cached in Redis when a cache is configured.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        parse_media_results, CatalogPage, Endpoint, Keyword, MediaDetails, MediaItem,
        MultiSearchResult, TmdbDetails, TmdbKeywordResponse, TmdbMultiResult, TmdbPagedResponse,
        TrendingWindow,
    },
    services::providers::CatalogProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

const PAGE_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 3600;
const KEYWORD_CACHE_TTL: u64 = 86400; // 1 day
const PROVIDER_NAME: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    pub fn new(cache: Option<Cache>, api_key: String, api_url: String, language: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            language,
            cache,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GETs `path` and decodes the JSON body
    ///
    /// A 404 maps to [`AppError::NotFound`] so callers can tell a missing
    /// resource apart from a failing service.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_page(
        &self,
        path: String,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        let canonical = format!(
            "{}?{}",
            path,
            serde_urlencoded::to_string(params).unwrap_or_default()
        );

        cached!(
            self.cache.as_ref(),
            CacheKey::Page(canonical),
            PAGE_CACHE_TTL,
            async move {
                let query: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let response: TmdbPagedResponse = self.get_json(&path, &query).await?;
                let items = parse_media_results(response.results, endpoint);

                tracing::debug!(
                    path = %path,
                    results = items.len(),
                    total = response.total_results,
                    provider = PROVIDER_NAME,
                    "Catalog page fetched"
                );

                Ok::<_, AppError>(CatalogPage {
                    items,
                    total_results: response.total_results,
                })
            }
        )
    }

    async fn fetch_list(&self, path: &str, fallback: Endpoint) -> AppResult<Vec<MediaItem>> {
        let response: TmdbPagedResponse = self.get_json(path, &[("page", "1")]).await?;
        Ok(parse_media_results(response.results, fallback))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn discover(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        self.fetch_page(format!("discover/{}", endpoint), endpoint, params)
            .await
    }

    async fn search(
        &self,
        endpoint: Endpoint,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CatalogPage> {
        if params.get("query").map_or(true, |q| q.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        self.fetch_page(format!("search/{}", endpoint), endpoint, params)
            .await
    }

    async fn details(&self, id: u64, endpoint: Endpoint) -> AppResult<MediaDetails> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Details(endpoint, id),
            DETAILS_CACHE_TTL,
            async move {
                let raw: TmdbDetails = self
                    .get_json(&format!("{}/{}", endpoint, id), &[])
                    .await?;
                Ok::<_, AppError>(raw.into_details(endpoint))
            }
        )
    }

    async fn recommendations(&self, id: u64, endpoint: Endpoint) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Recommendations(endpoint, id),
            PAGE_CACHE_TTL,
            async move {
                let items = match self
                    .fetch_list(&format!("{}/{}/recommendations", endpoint, id), endpoint)
                    .await
                {
                    Ok(items) if !items.is_empty() => items,
                    Ok(_) | Err(AppError::NotFound(_)) => {
                        tracing::debug!(
                            id = id,
                            endpoint = %endpoint,
                            provider = PROVIDER_NAME,
                            "No recommendations, falling back to similar titles"
                        );
                        self.fetch_list(&format!("{}/{}/similar", endpoint, id), endpoint)
                            .await?
                    }
                    Err(e) => return Err(e),
                };
                Ok::<_, AppError>(items)
            }
        )
    }

    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Trending(window),
            PAGE_CACHE_TTL,
            async move {
                let items = self
                    .fetch_list(&format!("trending/all/{}", window.as_str()), Endpoint::Movie)
                    .await?;

                tracing::info!(
                    window = window.as_str(),
                    results = items.len(),
                    provider = PROVIDER_NAME,
                    "Trending fetched"
                );

                Ok::<_, AppError>(items)
            }
        )
    }

    async fn search_keywords(&self, text: &str) -> AppResult<Vec<Keyword>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::KeywordSearch(text.to_string()),
            KEYWORD_CACHE_TTL,
            async move {
                let response: TmdbKeywordResponse = self
                    .get_json("search/keyword", &[("query", text), ("page", "1")])
                    .await?;
                Ok::<_, AppError>(response.results)
            }
        )
    }

    async fn keyword_by_id(&self, id: u64) -> AppResult<Keyword> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Keyword(id),
            KEYWORD_CACHE_TTL,
            async move { self.get_json::<Keyword>(&format!("keyword/{}", id), &[]).await }
        )
    }

    async fn search_multi(
        &self,
        text: &str,
        include_adult: bool,
    ) -> AppResult<Vec<MultiSearchResult>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let include_adult = if include_adult { "true" } else { "false" };
        let response: TmdbPagedResponse = self
            .get_json(
                "search/multi",
                &[
                    ("query", text),
                    ("include_adult", include_adult),
                    ("page", "1"),
                ],
            )
            .await?;

        let results: Vec<MultiSearchResult> = response
            .results
            .into_iter()
            .filter_map(|value| {
                serde_json::from_value::<TmdbMultiResult>(value)
                    .ok()
                    .and_then(TmdbMultiResult::into_result)
            })
            .collect();

        tracing::info!(
            query = %text,
            results = results.len(),
            provider = PROVIDER_NAME,
            "Multi search completed"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_url: &str) -> TmdbProvider {
        TmdbProvider::new(
            None,
            "test_key".to_string(),
            api_url.to_string(),
            "en-US".to_string(),
        )
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let p = provider("https://api.themoviedb.org/3/");
        assert_eq!(
            p.url("/discover/movie"),
            "https://api.themoviedb.org/3/discover/movie"
        );
        assert_eq!(p.url("movie/550"), "https://api.themoviedb.org/3/movie/550");
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider("http://localhost").name(), "tmdb");
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let p = provider("http://localhost:9");
        let mut params = BTreeMap::new();
        params.insert("query".to_string(), "   ".to_string());

        let result = p.search(Endpoint::Movie, &params).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_keyword_search_skips_the_network() {
        let p = provider("http://localhost:9");
        assert!(p.search_keywords("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uncached_calls_propagate_transport_errors() {
        // Nothing listens on the discard port
        let p = provider("http://127.0.0.1:9");

        let page = p.discover(Endpoint::Movie, &BTreeMap::new()).await;
        assert!(matches!(page, Err(AppError::HttpClient(_))));

        let details = p.details(550, Endpoint::Movie).await;
        assert!(matches!(details, Err(AppError::HttpClient(_))));

        let trending = p.trending(TrendingWindow::Week).await;
        assert!(matches!(trending, Err(AppError::HttpClient(_))));

        let keywords = p.search_keywords("heist").await;
        assert!(matches!(keywords, Err(AppError::HttpClient(_))));
    }
}

//! Runs compiled filter queries against the catalog.

use crate::error::AppResult;
use crate::models::{CatalogPage, FilterParams, UserLibrary};
use crate::services::providers::CatalogProvider;
use crate::services::query_compiler::{compile, CompileContext, CompiledQuery};

async fn run(provider: &dyn CatalogProvider, query: &CompiledQuery) -> AppResult<CatalogPage> {
    match query.requests.as_slice() {
        [] => Ok(CatalogPage::empty()),
        [single] => provider.execute(single).await,
        [first, second, ..] => {
            let (first, second) = tokio::join!(provider.execute(first), provider.execute(second));
            let mut page = first?;
            page.merge(second?);
            Ok(page)
        }
    }
}

/// Executes every request of `query`, merging pages in endpoint order
///
/// Anime runs its movie and tv requests concurrently and lists films first.
/// Any failing request turns the whole result into an empty page.
pub async fn execute_query(provider: &dyn CatalogProvider, query: &CompiledQuery) -> CatalogPage {
    match run(provider, query).await {
        Ok(page) => page,
        Err(e) => {
            let requests: Vec<String> = query.requests.iter().map(|r| r.canonical()).collect();
            tracing::warn!(
                error = %e,
                requests = ?requests,
                provider = provider.name(),
                "Discovery failed, returning empty page"
            );
            CatalogPage::empty()
        }
    }
}

/// Compiles `filters` at their current page and runs the result
pub async fn discover(
    provider: &dyn CatalogProvider,
    filters: &FilterParams,
    ctx: &CompileContext,
) -> CatalogPage {
    let query = compile(filters, filters.page, ctx);
    execute_query(provider, &query).await
}

/// Drops watched titles when the user asked for it
pub fn apply_library(page: &mut CatalogPage, library: &UserLibrary) {
    if library.preferences.hide_watched {
        page.exclude(&library.watched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Endpoint, MediaItem, MediaKind};
    use crate::services::providers::MockCatalogProvider;
    use chrono::NaiveDate;

    fn item(id: u64, endpoint: Endpoint) -> MediaItem {
        MediaItem {
            id,
            title: format!("Title {}", id),
            media_type: endpoint,
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 6.5,
            genre_ids: vec![16],
            adult: false,
            original_language: "ja".to_string(),
        }
    }

    fn ctx() -> CompileContext {
        CompileContext::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(), "IN")
    }

    #[tokio::test]
    async fn test_film_discovery_runs_one_request() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_execute()
            .withf(|request| request.endpoint == Endpoint::Movie)
            .times(1)
            .returning(|_| {
                Ok(CatalogPage {
                    items: vec![item(1, Endpoint::Movie)],
                    total_results: 1,
                })
            });

        let page = discover(&mock, &FilterParams::default(), &ctx()).await;
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_results, 1);
    }

    #[tokio::test]
    async fn test_anime_merges_films_first() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_execute().times(2).returning(|request| {
            let page = match request.endpoint {
                Endpoint::Movie => CatalogPage {
                    items: vec![item(1, Endpoint::Movie), item(2, Endpoint::Movie)],
                    total_results: 20,
                },
                Endpoint::Tv => CatalogPage {
                    items: vec![item(3, Endpoint::Tv)],
                    total_results: 10,
                },
            };
            Ok(page)
        });

        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Anime);

        let page = discover(&mock, &filters, &ctx()).await;
        let ids: Vec<u64> = page.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(page.total_results, 30);
    }

    #[tokio::test]
    async fn test_any_anime_failure_empties_the_page() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_execute().returning(|request| match request.endpoint {
            Endpoint::Movie => Ok(CatalogPage {
                items: vec![item(1, Endpoint::Movie)],
                total_results: 1,
            }),
            Endpoint::Tv => Err(AppError::ExternalApi("tv down".to_string())),
        });
        mock.expect_name().return_const("mock");

        let mut filters = FilterParams::default();
        filters.set_media_kind(MediaKind::Anime);

        let page = discover(&mock, &filters, &ctx()).await;
        assert_eq!(page, CatalogPage::empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_empty_page() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_execute()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");

        let page = discover(&mock, &FilterParams::default(), &ctx()).await;
        assert!(page.items.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[test]
    fn test_hide_watched() {
        let mut page = CatalogPage {
            items: vec![item(1, Endpoint::Movie), item(2, Endpoint::Movie)],
            total_results: 2,
        };
        let mut library = UserLibrary::default();
        library.watched.push(2);

        apply_library(&mut page, &library);
        assert_eq!(page.items.len(), 2);

        library.preferences.hide_watched = true;
        apply_library(&mut page, &library);
        let ids: Vec<u64> = page.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1]);
    }
}

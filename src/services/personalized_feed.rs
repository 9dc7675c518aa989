use serde::Serialize;
use std::sync::Arc;

use crate::models::{Endpoint, MediaItem, SortOrder, TrendingWindow, UserLibrary};
use crate::services::interest_profile::{build_profile, InterestProfile};
use crate::services::providers::CatalogProvider;
use crate::services::query_compiler::CatalogRequest;

/// Items a caller shows from one feed
pub const FEED_DISPLAY_LIMIT: usize = 10;
pub const FEED_GENRE_COUNT: usize = 3;
pub const FEED_LANGUAGE_COUNT: usize = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Feed {
    /// False when the library had no genre signal and trending was served
    pub personalized: bool,
    pub items: Vec<MediaItem>,
}

impl Feed {
    /// Caps the feed at [`FEED_DISPLAY_LIMIT`]
    pub fn for_display(mut self) -> Self {
        self.items.truncate(FEED_DISPLAY_LIMIT);
        self
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// The movie discovery request for a warm profile
pub fn feed_request(profile: &InterestProfile) -> CatalogRequest {
    let mut request = CatalogRequest::discover(Endpoint::Movie);
    request.set("with_genres", join(&profile.top_genres(FEED_GENRE_COUNT)));

    let languages = profile.top_languages(FEED_LANGUAGE_COUNT);
    if !languages.is_empty() {
        request.set("with_original_language", join(&languages));
    }

    request.set("sort_by", SortOrder::Popularity.to_param(Endpoint::Movie));
    request.set("include_adult", false);
    request.set("page", 1);
    request
}

/// Generates the personalized feed for a library
///
/// A cold profile gets this week's trending titles as-is. Otherwise the
/// profile's top genres and languages drive a popularity-sorted discovery
/// and anything watched or disliked is removed. Catalog failures yield an
/// empty feed.
pub async fn generate_feed(provider: Arc<dyn CatalogProvider>, library: &UserLibrary) -> Feed {
    let profile = build_profile(Arc::clone(&provider), library).await;

    if profile.is_cold() {
        let items = provider
            .trending(TrendingWindow::Week)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, provider = provider.name(), "Trending fetch failed");
                Vec::new()
            });
        return Feed {
            personalized: false,
            items,
        };
    }

    let request = feed_request(&profile);
    let mut page = match provider.execute(&request).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(
                error = %e,
                request = %request.canonical(),
                provider = provider.name(),
                "Feed discovery failed"
            );
            return Feed {
                personalized: true,
                items: Vec::new(),
            };
        }
    };

    page.exclude(&library.excluded_ids());

    tracing::info!(
        genres = ?profile.top_genres(FEED_GENRE_COUNT),
        results = page.items.len(),
        "Personalized feed generated"
    );

    Feed {
        personalized: true,
        items: page.items,
    }
}

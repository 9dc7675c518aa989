use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::models::{Endpoint, MediaDetails, UserLibrary};
use crate::services::providers::CatalogProvider;

/// Only the most recent entries of each list are profiled
pub const RECENT_LIMIT: usize = 10;

pub const FAVORITE_WEIGHT: i32 = 3;
pub const WATCHLIST_WEIGHT: i32 = 2;
pub const WATCHED_WEIGHT: i32 = 1;
pub const DISLIKED_WEIGHT: i32 = -5;

/// Weighted genre and language affinities derived from a library
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InterestProfile {
    pub genre_scores: BTreeMap<u32, i32>,
    pub language_scores: BTreeMap<String, i32>,
    pub seen_ids: BTreeSet<u64>,
}

impl InterestProfile {
    /// No genre signal yet; callers fall back to trending
    pub fn is_cold(&self) -> bool {
        self.genre_scores.is_empty()
    }

    pub fn top_genres(&self, n: usize) -> Vec<u32> {
        top_n(&self.genre_scores, n)
    }

    pub fn top_languages(&self, n: usize) -> Vec<String> {
        top_n(&self.language_scores, n)
    }

    fn add(&mut self, details: &MediaDetails, weight: i32) {
        for genre in &details.genres {
            *self.genre_scores.entry(genre.id).or_insert(0) += weight;
        }
        if !details.original_language.is_empty() {
            *self
                .language_scores
                .entry(details.original_language.clone())
                .or_insert(0) += weight;
        }
    }
}

/// Highest scores first; equal scores keep ascending key order
fn top_n<K: Ord + Clone>(scores: &BTreeMap<K, i32>, n: usize) -> Vec<K> {
    let mut entries: Vec<(&K, &i32)> = scores.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

fn recent(ids: &[u64]) -> &[u64] {
    &ids[ids.len().saturating_sub(RECENT_LIMIT)..]
}

/// Lists in claim order with their weights
fn weighted_lists(library: &UserLibrary) -> [(&[u64], i32); 4] {
    [
        (library.liked.as_slice(), FAVORITE_WEIGHT),
        (library.watchlist.as_slice(), WATCHLIST_WEIGHT),
        (library.watched.as_slice(), WATCHED_WEIGHT),
        (library.disliked.as_slice(), DISLIKED_WEIGHT),
    ]
}

/// Builds an interest profile from the user's recent library entries
///
/// Ids are claimed synchronously in list order, so an id present in several
/// lists only counts under the first. Details are then fetched concurrently;
/// since scores are plain sums the result does not depend on which fetch
/// finishes first. A failed fetch contributes nothing.
pub async fn build_profile(
    provider: Arc<dyn CatalogProvider>,
    library: &UserLibrary,
) -> InterestProfile {
    let mut profile = InterestProfile::default();
    let mut tasks = Vec::new();

    for (ids, weight) in weighted_lists(library) {
        for &id in recent(ids) {
            if !profile.seen_ids.insert(id) {
                continue;
            }
            let provider = Arc::clone(&provider);
            let task = tokio::spawn(async move { provider.details(id, Endpoint::Movie).await });
            tasks.push((id, weight, task));
        }
    }

    let mut success_count = 0;
    let mut error_count = 0;
    for (id, weight, task) in tasks {
        match task.await {
            Ok(Ok(details)) => {
                profile.add(&details, weight);
                success_count += 1;
            }
            Ok(Err(e)) => {
                error_count += 1;
                tracing::warn!(id = id, error = %e, "Failed to fetch details for profile");
            }
            Err(e) => {
                error_count += 1;
                tracing::error!(id = id, error = %e, "Profile fetch task panicked");
            }
        }
    }

    if error_count > 0 {
        tracing::warn!(
            success_count = success_count,
            error_count = error_count,
            "Interest profile built with partial failures"
        );
    }

    profile
}

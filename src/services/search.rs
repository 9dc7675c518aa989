//! Resolves a classified search into results.

use serde::Serialize;

use crate::models::{Endpoint, FilterParams, MediaItem, MediaKind, MultiSearchResult};
use crate::services::discovery;
use crate::services::providers::CatalogProvider;
use crate::services::query_compiler::CompileContext;
use crate::services::search_intent::{parse_intent, IntentKind, SearchIntent};
use crate::services::url_codec;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResponse {
    pub intent: SearchIntent,
    pub items: Vec<MediaItem>,
    pub total_results: u64,
    /// Encoded filters the results came from, when the search ran as a
    /// discovery; clients navigate to it to keep browsing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

/// Picks the catalog entry a similar-intent refers to
///
/// People are never targets. With a media hint the first matching kind
/// wins, otherwise the first movie or show.
fn pick_target(results: &[MultiSearchResult], hint: Option<MediaKind>) -> Option<(u64, Endpoint)> {
    let wanted = match hint {
        Some(MediaKind::Film) => Some(Endpoint::Movie),
        Some(MediaKind::Series) => Some(Endpoint::Tv),
        _ => None,
    };

    let titles = results
        .iter()
        .filter_map(|r| r.media_type.endpoint().map(|endpoint| (r.id, endpoint)));

    match wanted {
        Some(wanted) => titles
            .clone()
            .find(|(_, endpoint)| *endpoint == wanted)
            .or_else(|| titles.clone().next()),
        None => titles.clone().next(),
    }
}

/// "Movies like X": finds X, then its recommendations
pub async fn resolve_similar(
    provider: &dyn CatalogProvider,
    intent: &SearchIntent,
    include_adult: bool,
) -> Vec<MediaItem> {
    let results = match provider.search_multi(&intent.query, include_adult).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, title = %intent.query, "Similar-title lookup failed");
            return Vec::new();
        }
    };

    let Some((id, endpoint)) = pick_target(&results, intent.media_kind) else {
        tracing::info!(title = %intent.query, "No title found for similar search");
        return Vec::new();
    };

    match provider.recommendations(id, endpoint).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, id = id, endpoint = %endpoint, "Recommendations failed");
            Vec::new()
        }
    }
}

/// Classifies `input` and runs it
///
/// Filter intents apply their patch on top of `base` and run a discovery;
/// plain text runs a text search with the rest of `base` kept.
pub async fn search(
    provider: &dyn CatalogProvider,
    input: &str,
    base: &FilterParams,
    ctx: &CompileContext,
) -> SearchResponse {
    let intent = parse_intent(input);

    match intent.kind {
        IntentKind::Similar => {
            let items = resolve_similar(provider, &intent, base.effective_include_adult()).await;
            SearchResponse {
                total_results: items.len() as u64,
                items,
                intent,
                filters: None,
            }
        }
        IntentKind::Filter | IntentKind::Text => {
            let mut filters = base.clone();
            match &intent.patch {
                Some(patch) => {
                    filters.set_query(String::new());
                    filters.apply_patch(patch);
                }
                None => filters.set_query(input.trim()),
            }

            let page = discovery::discover(provider, &filters, ctx).await;
            SearchResponse {
                intent,
                items: page.items,
                total_results: page.total_results,
                filters: Some(url_codec::encode(&filters)),
            }
        }
    }
}

use crate::models::{FilterParams, Keyword};
use crate::services::providers::CatalogProvider;

/// Most keyword names looked up for one filter set
pub const MAX_RESOLVED_KEYWORDS: usize = 20;

/// Keyword suggestions for free text; failures yield no suggestions
pub async fn suggest_keywords(provider: &dyn CatalogProvider, text: &str) -> Vec<Keyword> {
    match provider.search_keywords(text).await {
        Ok(keywords) => keywords,
        Err(e) => {
            tracing::warn!(error = %e, query = %text, "Keyword search failed");
            Vec::new()
        }
    }
}

/// Fills in names for keywords decoded from a shared link
///
/// Links only carry ids. Up to [`MAX_RESOLVED_KEYWORDS`] placeholders are
/// looked up; a failed or skipped lookup keeps the placeholder so the filter
/// itself still applies. The page cursor is left alone.
pub async fn resolve_keyword_names(provider: &dyn CatalogProvider, filters: &mut FilterParams) {
    let placeholders = filters
        .user_keywords
        .iter()
        .filter(|k| k.is_placeholder())
        .count();
    if placeholders > MAX_RESOLVED_KEYWORDS {
        tracing::warn!(
            placeholders = placeholders,
            limit = MAX_RESOLVED_KEYWORDS,
            "Too many keywords to resolve, keeping the rest as placeholders"
        );
    }

    let pending = filters
        .user_keywords
        .iter_mut()
        .filter(|k| k.is_placeholder())
        .take(MAX_RESOLVED_KEYWORDS);
    for keyword in pending {
        match provider.keyword_by_id(keyword.id).await {
            Ok(resolved) => keyword.name = resolved.name,
            Err(e) => {
                tracing::warn!(id = keyword.id, error = %e, "Keeping placeholder keyword name");
            }
        }
    }
}

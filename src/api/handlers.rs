use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{
    CatalogPage, FilterParams, Keyword, MediaItem, Preferences, TrendingWindow, UserLibrary,
};
use crate::services::discovery;
use crate::services::keywords;
use crate::services::library::{self, ToggleRequest, ToggleResponse};
use crate::services::personalized_feed::{generate_feed, Feed};
use crate::services::search::{self, SearchResponse};
use crate::services::search_intent::{parse_intent, SearchIntent};
use crate::services::surface::Loaded;
use crate::services::url_codec;

use super::AppState;

/// Client-chosen name of the results slot a discovery renders into
pub const SURFACE_ID_HEADER: &str = "x-surface-id";
/// Set on responses that lost the race to a newer request on their surface
pub const SURFACE_STALE_HEADER: &str = "x-surface-stale";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub window: TrendingWindow,
}

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    /// Canonical query string of the filters
    pub query: String,
    pub filters: FilterParams,
}

/// Decodes the raw query string; also returns the optional `user` parameter
fn decode_params(raw: Option<String>) -> (FilterParams, Option<String>) {
    let raw = raw.unwrap_or_default();
    let filters = url_codec::decode_query(&raw);
    let user = serde_urlencoded::from_str::<Vec<(String, String)>>(&raw)
        .unwrap_or_default()
        .into_iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value);
    (filters, user)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Filtered discovery
///
/// With an `x-surface-id` header only the newest request per surface is
/// committed; an overtaken request answers with the surface's current page
/// and `x-surface-stale: true`.
pub async fn discover(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> AppResult<Response> {
    let (filters, user) = decode_params(raw);

    // Tickets are issued before any other await
    let surface_id = headers
        .get(SURFACE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty());
    let slot = match surface_id {
        Some(id) => {
            let surface = state.surface(id).await;
            let ticket = surface.begin().await;
            Some((surface, ticket))
        }
        None => None,
    };

    let library = match user {
        Some(user_id) => Some(library::load(&*state.library, &user_id).await?),
        None => None,
    };
    let ctx = state.compile_context();

    let fetch = async {
        let mut page = discovery::discover(&*state.provider, &filters, &ctx).await;
        if let Some(library) = &library {
            discovery::apply_library(&mut page, library);
        }
        page
    };

    let (page, stale) = match slot {
        Some((surface, ticket)) => match surface.load_with_ticket(ticket, fetch).await {
            Loaded::Fresh(page) => (page, false),
            Loaded::Stale(current) => (current.unwrap_or_else(CatalogPage::empty), true),
        },
        None => (fetch.await, false),
    };

    let mut response = Json(page).into_response();
    if stale {
        response
            .headers_mut()
            .insert(SURFACE_STALE_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

/// Normalizes a filter query string and resolves keyword names
pub async fn canonical_filters(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Json<FiltersResponse> {
    let (mut filters, _) = decode_params(raw);
    keywords::resolve_keyword_names(&*state.provider, &mut filters).await;
    Json(FiltersResponse {
        query: url_codec::encode(&filters),
        filters,
    })
}

/// Resets filters to defaults, using the user's preferences when given
pub async fn reset_filters(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<FiltersResponse>> {
    let (mut filters, user) = decode_params(raw);
    let preferences = match user {
        Some(user_id) => library::load(&*state.library, &user_id).await?.preferences,
        None => Preferences::default(),
    };
    filters.reset(&preferences);
    Ok(Json(FiltersResponse {
        query: url_codec::encode(&filters),
        filters,
    }))
}

pub async fn intent(Query(params): Query<TextQuery>) -> Json<SearchIntent> {
    Json(parse_intent(&params.q))
}

/// Classifies `q` and resolves it; remaining parameters are the base filters
pub async fn search(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> AppResult<Json<SearchResponse>> {
    let (base, _) = decode_params(raw);
    if !base.has_query() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    let input = base.query.clone();
    let ctx = state.compile_context();
    let response = search::search(&*state.provider, &input, &base, &ctx).await;
    Ok(Json(response))
}

pub async fn search_keywords(
    State(state): State<AppState>,
    Query(params): Query<TextQuery>,
) -> Json<Vec<Keyword>> {
    Json(keywords::suggest_keywords(&*state.provider, &params.q).await)
}

pub async fn get_keyword(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Keyword>> {
    let keyword = state.provider.keyword_by_id(id).await?;
    Ok(Json(keyword))
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> Json<Vec<MediaItem>> {
    let items = state
        .provider
        .trending(params.window)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, window = params.window.as_str(), "Trending fetch failed");
            Vec::new()
        });
    Json(items)
}

pub async fn get_library(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserLibrary>> {
    let library = library::load(&*state.library, &user_id).await?;
    Ok(Json(library))
}

pub async fn toggle_library(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> AppResult<Json<ToggleResponse>> {
    let response =
        library::toggle(&*state.library, &state.library_locks, &user_id, &request).await?;
    Ok(Json(response))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(preferences): Json<Preferences>,
) -> AppResult<Json<UserLibrary>> {
    let library = library::update_preferences(
        &*state.library,
        &state.library_locks,
        &user_id,
        preferences,
    )
    .await?;
    Ok(Json(library))
}

/// Personalized feed, capped for display
pub async fn feed(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Feed>> {
    let library = library::load(&*state.library, &user_id).await?;
    let feed = generate_feed(state.provider.clone(), &library).await;
    Ok(Json(feed.for_display()))
}

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Discovery
        .route("/discover", get(handlers::discover))
        .route("/trending", get(handlers::trending))
        .route("/filters/canonical", get(handlers::canonical_filters))
        .route("/filters/reset", get(handlers::reset_filters))
        // Search
        .route("/intent", get(handlers::intent))
        .route("/search", get(handlers::search))
        .route("/keywords", get(handlers::search_keywords))
        .route("/keywords/:id", get(handlers::get_keyword))
        // Library
        .route("/library/:user_id", get(handlers::get_library))
        .route("/library/:user_id/toggle", post(handlers::toggle_library))
        .route(
            "/library/:user_id/preferences",
            put(handlers::update_preferences),
        )
        .route("/library/:user_id/feed", get(handlers::feed))
}

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Cached read surface
        .route("/cars", get(handlers::list_cars))
        .route("/cars/statistics", get(handlers::car_statistics))
        .route("/cars/{id}", get(handlers::show_car))
        // Listing mutations (drive cache invalidation)
        .route("/listings", post(handlers::create_listing))
        .route("/listings/{id}", put(handlers::update_listing))
        .route("/listings/{id}", delete(handlers::delete_listing))
        .route("/listings/{id}/restore", post(handlers::restore_listing))
        // Admin routes
        .route("/admin/cache/purge", post(handlers::purge_cache))
        .route("/admin/cache/status", get(handlers::cache_status))
        // Middleware
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use crate::models::{CreateListingRequest, UpdateListingRequest};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use forecourt::listing::Listing;
use tracing::error;

/// POST /listings
pub async fn create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), StatusCode> {
    let listing = state.repository.create(req);
    state.observer.created(&listing).await.map_err(|e| {
        error!(error = %e, listing_id = listing.id, "invalidation after create failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// PUT /listings/{id}
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<Json<Listing>, StatusCode> {
    let (before, after) = state.repository.update(id, req).ok_or(StatusCode::NOT_FOUND)?;
    state.observer.updated(&before, &after).await.map_err(|e| {
        error!(error = %e, listing_id = id, "invalidation after update failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(after))
}

/// DELETE /listings/{id}
pub async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let listing = state.repository.remove(id).ok_or(StatusCode::NOT_FOUND)?;
    state.observer.deleted(&listing).await.map_err(|e| {
        error!(error = %e, listing_id = id, "invalidation after delete failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /listings/{id}/restore
pub async fn restore_listing(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Listing>, StatusCode> {
    let listing = state.repository.restore(id).ok_or(StatusCode::NOT_FOUND)?;
    state.observer.restored(&listing).await.map_err(|e| {
        error!(error = %e, listing_id = id, "invalidation after restore failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(listing))
}

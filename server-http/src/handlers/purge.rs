use crate::models::{CacheStatusResponse, ErrorResponse, PurgeRequest, PurgeResponse};
use crate::state::AppState;
use crate::validation::validate_purge_request;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use forecourt::cache::FlushOutcome;
use std::time::Instant;
use tracing::{error, info};

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-correlation-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("cache_purge_{}", uuid::Uuid::new_v4()))
}

/// POST /admin/cache/purge
///
/// Purges the given keys and/or tags; with neither supplied, flushes the
/// whole store. Tag syntax is validated before any store call.
pub async fn purge_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let started = Instant::now();
    let correlation_id = correlation_id(&headers);

    let (keys, tags) = validate_purge_request(&req).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_correlation(
                e.to_string(),
                correlation_id.clone(),
            )),
        )
    })?;

    info!(
        %correlation_id,
        keys_count = keys.len(),
        tags_count = tags.len(),
        "cache purge requested"
    );

    let mut purged_keys = Vec::new();
    let mut all_cache_cleared = false;

    let result = async {
        if keys.is_empty() && tags.is_empty() {
            state.cache.flush(&[]).await?;
            all_cache_cleared = true;
            return Ok(());
        }
        if !keys.is_empty() {
            purged_keys.extend(state.cache.flush_by_keys(&keys).await?);
        }
        if !tags.is_empty() {
            if let FlushOutcome::Purged(keys) = state.cache.flush(&tags).await? {
                purged_keys.extend(keys);
            }
        }
        Ok::<(), shared::Error>(())
    }
    .await;

    let query_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    if let Err(e) = result {
        error!(%correlation_id, error = %e, "cache purge failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_correlation(
                format!("Cache purge failed: {e}"),
                correlation_id,
            )),
        ));
    }

    info!(
        %correlation_id,
        purged_count = purged_keys.len(),
        all_cache_cleared,
        "cache purge completed"
    );

    Ok(Json(PurgeResponse {
        status: "success",
        message: "Cache purged successfully".to_string(),
        purged_count: purged_keys.len(),
        purged_keys,
        all_cache_cleared,
        query_time_ms,
        correlation_id,
    }))
}

/// GET /admin/cache/status
pub async fn cache_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<CacheStatusResponse> {
    Json(CacheStatusResponse {
        status: "success",
        cache_driver: state.config.cache_driver.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_check: "ok",
        correlation_id: correlation_id(&headers),
    })
}

use crate::models::CarQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use forecourt::catalog::CachedPayload;
use forecourt::etag::{self, Conditional};
use shared::Error;
use std::time::Instant;
use tracing::{error, info};

/// GET /cars
pub async fn list_cars(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CarQuery>,
) -> Result<Response, StatusCode> {
    let started = Instant::now();
    let request = query.into_browse_request();
    info!(page = request.page, per_page = request.per_page, "GET /cars");

    let payload = state.catalog.browse(&request).await.map_err(|e| {
        error!(error = %e, "browse failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let cache_control = format!("public, max-age={}", state.config.browse_ttl_secs);
    Ok(conditional_response(payload, &headers, &cache_control, started))
}

/// GET /cars/{id}
pub async fn show_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Response, StatusCode> {
    let started = Instant::now();
    info!(id, "GET /cars/{{id}}");

    let payload = match state.catalog.show(id).await {
        Ok(payload) => payload,
        Err(Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(error = %e, id, "show failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let cache_control = format!("public, max-age={}", state.config.show_ttl_secs);
    Ok(conditional_response(payload, &headers, &cache_control, started))
}

/// GET /cars/statistics
pub async fn car_statistics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CarQuery>,
) -> Result<Response, StatusCode> {
    let started = Instant::now();
    let filters = query.filters();

    let payload = state.catalog.statistics(&filters).await.map_err(|e| {
        error!(error = %e, "statistics failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let cache_control = format!("public, max-age={}", state.config.statistics_ttl_secs);
    Ok(conditional_response(payload, &headers, &cache_control, started))
}

/// Shared conditional-response assembly: fingerprint the payload, compare
/// against `If-None-Match`, and emit either 304 or the full body.
///
/// `X-Cache` reports the read-through outcome only; whether the response is
/// a 304 is carried by the status code. The two are independent: a fresh
/// computation can still be "not modified", and a cache hit still needs a
/// full body when the client sent no fingerprint.
fn conditional_response(
    payload: CachedPayload,
    headers: &HeaderMap,
    cache_control: &str,
    started: Instant,
) -> Response {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    let hit = payload.hit;
    let cache_key = payload.cache_key;
    let outcome = etag::evaluate(payload.body, if_none_match);
    let query_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    let builder = Response::builder()
        .header(header::ETAG, outcome.etag().as_str())
        .header(header::CACHE_CONTROL, cache_control)
        .header(header::VARY, "Accept, Accept-Encoding")
        .header("X-Cache", if hit { "HIT" } else { "MISS" })
        .header("X-Cache-Key", cache_key)
        .header("X-Query-Time-ms", format!("{query_time_ms:.2}"));

    let result = match outcome {
        Conditional::NotModified { .. } => builder
            .status(StatusCode::NOT_MODIFIED)
            .body(axum::body::Body::empty()),
        Conditional::Fresh { body, .. } => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body)),
    };

    // The builder only fails on malformed header values, which are all
    // produced locally.
    result.unwrap_or_else(|_| {
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(axum::body::Body::empty())
            .expect("empty response")
    })
}

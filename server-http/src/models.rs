use chrono::{DateTime, Utc};
use forecourt::catalog::BrowseRequest;
use forecourt::listing::{BrowseFilters, ListingStatus, SortDirection, SortSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// === Browse query ===

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CarQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub country_code: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub price_min_cents: Option<i64>,
    pub price_max_cents: Option<i64>,
    pub status: Option<ListingStatus>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub include_facets: bool,
}

impl CarQuery {
    pub fn filters(&self) -> BrowseFilters {
        BrowseFilters {
            make: self.make.clone(),
            model: self.model.clone(),
            country_code: self.country_code.clone(),
            year_min: self.year_min,
            year_max: self.year_max,
            price_min_cents: self.price_min_cents,
            price_max_cents: self.price_max_cents,
            status: self.status,
        }
    }

    pub fn into_browse_request(self) -> BrowseRequest {
        let filters = self.filters();
        let sort = self.sort_by.map(|field| {
            let mut columns = BTreeMap::new();
            columns.insert(field, self.sort_dir.unwrap_or(SortDirection::Desc));
            SortSpec(columns)
        });
        BrowseRequest {
            filters,
            sort,
            page: self.page,
            per_page: self.per_page,
            include_facets: self.include_facets,
        }
    }
}

// === Listing mutation models ===

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub dealer_id: Option<u64>,
    pub country_code: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_cents: i64,
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub listed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub dealer_id: Option<u64>,
    pub country_code: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price_cents: Option<i64>,
    pub status: Option<ListingStatus>,
}

// === Admin purge models ===

#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub status: &'static str,
    pub message: String,
    pub purged_keys: Vec<String>,
    pub purged_count: usize,
    pub all_cache_cleared: bool,
    pub query_time_ms: f64,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    pub status: &'static str,
    pub cache_driver: String,
    pub timestamp: String,
    pub uptime_check: &'static str,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation(message: impl Into<String>, correlation_id: String) -> Self {
        Self {
            status: "error",
            message: message.into(),
            correlation_id: Some(correlation_id),
        }
    }
}

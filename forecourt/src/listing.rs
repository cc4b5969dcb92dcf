use crate::cache::key::FilterValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    pub dealer_id: Option<u64>,
    pub country_code: Option<String>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_cents: i64,
    pub status: ListingStatus,
    pub listed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Sold,
    Suspended,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort columns mapped to directions. Canonically ordered so that the same
/// effective sort always serializes the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec(pub BTreeMap<String, SortDirection>);

impl SortSpec {
    /// The default browse ordering. Callers apply this before building a
    /// cache key, so an omitted sort and an explicit default are the same key.
    pub fn latest_first() -> Self {
        let mut sort = BTreeMap::new();
        sort.insert("listed_at".to_string(), SortDirection::Desc);
        Self(sort)
    }
}

/// Semantic browse parameters. Only fields that are actually set participate
/// in cache-key derivation, via [`BrowseFilters::to_filter_map`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilters {
    pub make: Option<String>,
    pub model: Option<String>,
    pub country_code: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub price_min_cents: Option<i64>,
    pub price_max_cents: Option<i64>,
    pub status: Option<ListingStatus>,
}

impl BrowseFilters {
    pub fn to_filter_map(&self) -> BTreeMap<String, FilterValue> {
        let mut map = BTreeMap::new();
        if let Some(make) = &self.make {
            map.insert("make".to_string(), FilterValue::Text(make.clone()));
        }
        if let Some(model) = &self.model {
            map.insert("model".to_string(), FilterValue::Text(model.clone()));
        }
        if let Some(cc) = &self.country_code {
            map.insert("country_code".to_string(), FilterValue::Text(cc.clone()));
        }
        if let Some(year) = self.year_min {
            map.insert("year_min".to_string(), FilterValue::Int(year as i64));
        }
        if let Some(year) = self.year_max {
            map.insert("year_max".to_string(), FilterValue::Int(year as i64));
        }
        if let Some(price) = self.price_min_cents {
            map.insert("price_min_cents".to_string(), FilterValue::Int(price));
        }
        if let Some(price) = self.price_max_cents {
            map.insert("price_max_cents".to_string(), FilterValue::Int(price));
        }
        if let Some(status) = self.status {
            map.insert(
                "status".to_string(),
                FilterValue::Text(status.as_str().to_string()),
            );
        }
        map
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(make) = &self.make {
            if !listing.make.eq_ignore_ascii_case(make) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if !listing.model.eq_ignore_ascii_case(model) {
                return false;
            }
        }
        if let Some(cc) = &self.country_code {
            match &listing.country_code {
                Some(listing_cc) if listing_cc.eq_ignore_ascii_case(cc) => {}
                _ => return false,
            }
        }
        if let Some(year) = self.year_min {
            if listing.year < year {
                return false;
            }
        }
        if let Some(year) = self.year_max {
            if listing.year > year {
                return false;
            }
        }
        if let Some(price) = self.price_min_cents {
            if listing.price_cents < price {
                return false;
            }
        }
        if let Some(price) = self.price_max_cents {
            if listing.price_cents > price {
                return false;
            }
        }
        if let Some(status) = self.status {
            if listing.status != status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            total.div_ceil(per_page.max(1) as u64) as u32
        };
        Self {
            items,
            total,
            page,
            per_page,
            last_page,
        }
    }
}

/// Make and year counts over the currently filtered listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCounts {
    pub makes: BTreeMap<String, u64>,
    pub years: BTreeMap<i32, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingStatistics {
    pub total_cars: u64,
    pub average_price_cents: i64,
    pub price_range_cents: Option<(i64, i64)>,
    pub year_range: Option<(i32, i32)>,
    pub makes_count: u64,
    pub countries_count: u64,
}

/// Whole days since a listing went live, clamped to zero for future-dated
/// listings. The previous implementation used a direction-sensitive diff that
/// went negative for past dates, which swept every past listing into the
/// freshest bucket; see DESIGN.md.
pub fn age_in_days(listed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - listed_at).num_days().max(0)
}

/// Recency points for lead scoring, bucketed by listing age.
pub fn recency_score(age_days: i64) -> u32 {
    if age_days <= 1 {
        40
    } else if age_days <= 7 {
        30
    } else if age_days <= 30 {
        20
    } else if age_days <= 90 {
        10
    } else {
        0
    }
}

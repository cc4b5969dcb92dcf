use crate::listing::ListingStatus;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// History record for a meaningful field transition on a listing. Emitting
/// these is orthogonal to cache invalidation: a price or status transition
/// triggers the same tag flush as any other update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingEvent {
    PriceChanged(PriceChangedEvent),
    StatusChanged(StatusChangedEvent),
}

impl ListingEvent {
    pub fn listing_id(&self) -> u64 {
        match self {
            ListingEvent::PriceChanged(e) => e.listing_id,
            ListingEvent::StatusChanged(e) => e.listing_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangedEvent {
    pub listing_id: u64,
    pub old_price_cents: i64,
    pub new_price_cents: i64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub listing_id: u64,
    pub old_status: ListingStatus,
    pub new_status: ListingStatus,
    pub timestamp: u64,
}

/// Seconds since UNIX epoch.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

//! Entity-mutation hooks that translate a listing or dealer write into the
//! tag set to flush.
//!
//! Policy: over-invalidate rather than under-invalidate. A superset of the
//! strictly necessary tags only costs extra cache misses; an undersized set
//! serves stale data until natural TTL expiry.

use crate::cache::{CacheService, FlushOutcome, Tag};
use crate::events::{ListingEvent, PriceChangedEvent, StatusChangedEvent, now_timestamp};
use crate::listing::Listing;
use shared::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Tags a cached listing shape carries: the entity tag plus its country and
/// dealer groupings when known. An unrepresentable country code loses only
/// that one tag; the aggregates still cover it.
pub fn listing_tags(listing_id: u64, country_code: Option<&str>, dealer_id: Option<u64>) -> Vec<Tag> {
    let mut tags = vec![Tag::listing(listing_id)];
    if let Some(cc) = country_code {
        match Tag::country(cc) {
            Ok(tag) => tags.push(tag),
            Err(e) => warn!(listing_id, error = %e, "skipping country tag"),
        }
    }
    if let Some(dealer_id) = dealer_id {
        tags.push(Tag::dealer(dealer_id));
    }
    tags
}

pub fn dealer_tags(dealer_id: u64, country_code: Option<&str>) -> Vec<Tag> {
    let mut tags = vec![Tag::dealer(dealer_id)];
    if let Some(cc) = country_code {
        match Tag::country(cc) {
            Ok(tag) => tags.push(tag),
            Err(e) => warn!(dealer_id, error = %e, "skipping country tag"),
        }
    }
    tags
}

/// Listing lifecycle hook. Every mutation flushes the entity tags plus the
/// well-known aggregates any listing collection would have been tagged with.
#[derive(Clone)]
pub struct ListingObserver {
    cache: CacheService,
    events: Option<broadcast::Sender<ListingEvent>>,
}

impl ListingObserver {
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache,
            events: None,
        }
    }

    pub fn with_event_broadcaster(
        cache: CacheService,
        events: broadcast::Sender<ListingEvent>,
    ) -> Self {
        Self {
            cache,
            events: Some(events),
        }
    }

    pub async fn created(&self, listing: &Listing) -> Result<FlushOutcome> {
        info!(
            listing_id = listing.id,
            make = %listing.make,
            model = %listing.model,
            "listing created"
        );
        self.invalidate(listing).await
    }

    /// `before` is the snapshot prior to the write. Price and status
    /// transitions are recorded as history events; the flush happens either
    /// way.
    pub async fn updated(&self, before: &Listing, after: &Listing) -> Result<FlushOutcome> {
        if before.price_cents != after.price_cents {
            info!(
                listing_id = after.id,
                old_price_cents = before.price_cents,
                new_price_cents = after.price_cents,
                "listing price changed"
            );
            self.emit(ListingEvent::PriceChanged(PriceChangedEvent {
                listing_id: after.id,
                old_price_cents: before.price_cents,
                new_price_cents: after.price_cents,
                timestamp: now_timestamp(),
            }));
        }

        if before.status != after.status {
            info!(
                listing_id = after.id,
                old_status = before.status.as_str(),
                new_status = after.status.as_str(),
                "listing status changed"
            );
            self.emit(ListingEvent::StatusChanged(StatusChangedEvent {
                listing_id: after.id,
                old_status: before.status,
                new_status: after.status,
                timestamp: now_timestamp(),
            }));
        }

        self.invalidate(after).await
    }

    pub async fn deleted(&self, listing: &Listing) -> Result<FlushOutcome> {
        info!(listing_id = listing.id, "listing deleted");
        self.invalidate(listing).await
    }

    pub async fn restored(&self, listing: &Listing) -> Result<FlushOutcome> {
        info!(listing_id = listing.id, "listing restored");
        self.invalidate(listing).await
    }

    async fn invalidate(&self, listing: &Listing) -> Result<FlushOutcome> {
        let mut tags = listing_tags(
            listing.id,
            listing.country_code.as_deref(),
            listing.dealer_id,
        );
        tags.push(Tag::cars_list());
        tags.push(Tag::facets());
        tags.push(Tag::statistics());

        let outcome = self.cache.flush(&tags).await?;
        info!(
            listing_id = listing.id,
            purged_keys = outcome.purged_keys().len(),
            "cache invalidated for listing"
        );
        Ok(outcome)
    }

    fn emit(&self, event: ListingEvent) {
        if let Some(events) = &self.events {
            // A send error only means nobody is listening right now.
            let _ = events.send(event);
        }
    }
}

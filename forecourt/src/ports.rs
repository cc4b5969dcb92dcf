use crate::listing::{
    BrowseFilters, FacetCounts, Listing, ListingStatistics, Page, SortSpec,
};
use async_trait::async_trait;
use bytes::Bytes;
use shared::{Result, TtlMs};

// Ports are the pluggable extension points for the external collaborators:
// the flat key-value store and the listing persistence layer.

/// Port for the underlying key-value store.
///
/// The store offers no ordering, atomicity, or pattern-delete across keys;
/// everything tag-related is layered on top of these six operations.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns `Err(Error::NotFound)` on a miss or an expired entry.
    async fn get(&self, key: &str) -> Result<Bytes>;
    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()>;
    /// Store without expiry. Used for the tag index namespaces, which must
    /// outlive the entries they track.
    async fn put_forever(&self, key: &str, value: Bytes) -> Result<()>;
    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn flush_all(&self) -> Result<()>;
}

/// Port for listing persistence. Validation and storage of listings are
/// external concerns; the cache layer only reads through this.
#[async_trait]
pub trait ListingRepository: Send + Sync + 'static {
    async fn browse(
        &self,
        filters: &BrowseFilters,
        sort: &SortSpec,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Listing>>;

    async fn find(&self, id: u64) -> Result<Option<Listing>>;

    async fn facet_counts(&self, filters: &BrowseFilters) -> Result<FacetCounts>;

    async fn statistics(&self, filters: &BrowseFilters) -> Result<ListingStatistics>;
}

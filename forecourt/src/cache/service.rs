use crate::cache::tags::{Tag, TagIndex};
use crate::ports::KeyValueStore;
use bytes::Bytes;
use shared::{Error, Result, TtlMs};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a read-through lookup. `hit` feeds observability headers and is
/// independent of any conditional-response outcome downstream.
#[derive(Debug, Clone)]
pub struct Remembered {
    pub value: Bytes,
    pub hit: bool,
}

/// What a flush actually removed. The empty-tag case clears the whole store
/// and cannot enumerate keys, so it reports a sentinel instead of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    AllCleared,
    Purged(Vec<String>),
}

impl FlushOutcome {
    pub fn purged_keys(&self) -> &[String] {
        match self {
            FlushOutcome::AllCleared => &[],
            FlushOutcome::Purged(keys) => keys,
        }
    }
}

/// Read-through memoization and tag-driven invalidation over the flat store.
///
/// Fully stateless between calls: all state, including the tag index, lives
/// in the store. No retry, no timeout, and no single-flight collapsing of
/// concurrent misses; two concurrent producers for the same key both run and
/// both write.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    index: TagIndex,
}

impl CacheService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let index = TagIndex::new(store.clone());
        Self { store, index }
    }

    /// Returns the cached value for `key`, or runs `producer`, stores its
    /// result under `ttl`, and tags it. A failing producer propagates with
    /// nothing stored or tagged; errors are never negatively cached.
    pub async fn remember<F, Fut>(
        &self,
        key: &str,
        tags: &[Tag],
        ttl: TtlMs,
        producer: F,
    ) -> Result<Remembered>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        match self.store.get(key).await {
            Ok(value) => return Ok(Remembered { value, hit: true }),
            Err(Error::NotFound) => {}
            Err(e) => return Err(e),
        }

        let value = producer().await?;
        self.store.put(key, value.clone(), ttl).await?;
        self.index.tag_key(key, tags).await?;

        Ok(Remembered { value, hit: false })
    }

    /// Unconditional write-through; tags when `tags` is non-empty.
    pub async fn put(&self, key: &str, value: Bytes, ttl: TtlMs, tags: &[Tag]) -> Result<()> {
        self.store.put(key, value, ttl).await?;
        if !tags.is_empty() {
            self.index.tag_key(key, tags).await?;
        }
        Ok(())
    }

    /// Drops the entry and its index relationships. Idempotent.
    pub async fn forget(&self, key: &str) -> Result<()> {
        self.store.delete(key).await?;
        self.index.untag(key).await
    }

    /// Tag-driven bulk invalidation. An empty tag list flushes the entire
    /// store, index included. Otherwise each tag's key set is resolved and
    /// deleted, then the tag is cleared; the returned list holds only keys
    /// whose deletion was confirmed, so stale references resolve to nothing
    /// and are pruned in passing. A key live under several flushed tags may
    /// be reported once per tag; treat the list as informational.
    pub async fn flush(&self, tags: &[Tag]) -> Result<FlushOutcome> {
        if tags.is_empty() {
            self.store.flush_all().await?;
            info!("all cache cleared, tag mappings flushed with it");
            return Ok(FlushOutcome::AllCleared);
        }

        let mut purged = Vec::new();
        for tag in tags {
            let keys = self.index.keys_for_tag(tag).await?;
            for key in keys {
                match self.store.delete(&key).await {
                    Ok(true) => purged.push(key),
                    Ok(false) => {} // stale reference, pruned with the tag below
                    Err(e) => {
                        warn!(%tag, %key, error = %e, "key deletion failed, continuing flush");
                    }
                }
            }
            self.index.clear_tag(tag).await?;
        }

        Ok(FlushOutcome::Purged(purged))
    }

    /// Deletes the given keys directly, untagging each. Absent keys are
    /// skipped silently; the returned list holds the keys actually purged.
    pub async fn flush_by_keys(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut purged = Vec::new();
        for key in keys {
            if self.store.exists(key).await? {
                self.store.delete(key).await?;
                self.index.untag(key).await?;
                purged.push(key.clone());
            }
        }
        Ok(purged)
    }
}

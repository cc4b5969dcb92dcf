use async_trait::async_trait;
use bytes::Bytes;
use forecourt::ports::KeyValueStore;
use moka::future::Cache;
use shared::{Error, Result, TtlMs};
use std::fmt::Debug;
use std::time::Instant;

/// Per-entry expiry wrapper. Moka's built-in TTL is cache-global, while the
/// store contract needs both per-entry TTLs and forever-lived index entries
/// side by side, so the deadline travels with the value and is enforced on
/// read.
#[derive(Clone, Debug)]
struct Envelope {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Envelope {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Moka-based flat store. Lock-free concurrent access; no ordering or
/// cross-key atomicity, matching the store contract.
pub struct MokaStore {
    cache: Cache<String, Envelope>,
}

impl MokaStore {
    /// Unbounded store, the default for a single-process deployment.
    pub fn new(name: &str) -> Self {
        Self {
            cache: Cache::builder().name(name).build(),
        }
    }

    /// Bounded by entry count; eviction may drop live entries early, which
    /// the cache layer already tolerates as a miss.
    pub fn bounded(name: &str, max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().name(name).max_capacity(max_entries).build(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Bytes> {
        match self.cache.get(key).await {
            Some(envelope) if !envelope.is_expired() => Ok(envelope.value),
            Some(_) => {
                // Expired in place; drop it so the dead entry stops taking
                // up capacity.
                self.cache.invalidate(key).await;
                Err(Error::NotFound)
            }
            None => Err(Error::NotFound),
        }
    }

    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        let envelope = Envelope {
            value,
            expires_at: Some(Instant::now() + ttl.as_duration()),
        };
        self.cache.insert(key.to_string(), envelope).await;
        Ok(())
    }

    async fn put_forever(&self, key: &str, value: Bytes) -> Result<()> {
        let envelope = Envelope {
            value,
            expires_at: None,
        };
        self.cache.insert(key.to_string(), envelope).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.cache.get(key).await {
            Some(envelope) if !envelope.is_expired() => Ok(true),
            Some(_) => {
                self.cache.invalidate(key).await;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn flush_all(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

impl Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep};

    #[tokio::test]
    async fn put_and_get_round_trip() {
        let store = MokaStore::new("test");
        store
            .put("hello", Bytes::from_static(b"world"), TtlMs::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("hello").await.unwrap(), Bytes::from_static(b"world"));
        assert!(store.exists("hello").await.unwrap());
    }

    #[tokio::test]
    async fn get_nonexistent_is_not_found() {
        let store = MokaStore::new("test");
        let result = store.get("nonexistent").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound));
        assert!(!store.exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn delete_reports_whether_the_key_existed() {
        let store = MokaStore::new("test");
        store
            .put("k", Bytes::from_static(b"v"), TtlMs::from_secs(60))
            .await
            .unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(store.get("k").await.is_err());
    }

    #[tokio::test]
    async fn overwrite_replaces_the_value() {
        let store = MokaStore::new("test");
        store
            .put("k", Bytes::from_static(b"v1"), TtlMs::from_secs(60))
            .await
            .unwrap();
        store
            .put("k", Bytes::from_static(b"v2"), TtlMs::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Bytes::from_static(b"v2"));
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let store = MokaStore::new("test");
        store
            .put("k", Bytes::from_static(b"v"), TtlMs(50))
            .await
            .unwrap();
        assert!(store.exists("k").await.unwrap());

        sleep(Duration::from_millis(80)).await;
        assert!(matches!(store.get("k").await.unwrap_err(), Error::NotFound));
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn forever_entries_outlive_ttl_entries() {
        let store = MokaStore::new("test");
        store
            .put_forever("tag:cars_list", Bytes::from_static(b"[\"k\"]"))
            .await
            .unwrap();
        store
            .put("k", Bytes::from_static(b"v"), TtlMs(50))
            .await
            .unwrap();

        sleep(Duration::from_millis(80)).await;
        assert!(store.get("k").await.is_err());
        assert_eq!(
            store.get("tag:cars_list").await.unwrap(),
            Bytes::from_static(b"[\"k\"]")
        );
    }

    #[tokio::test]
    async fn flush_all_drops_everything_including_index_entries() {
        let store = MokaStore::new("test");
        store
            .put("k", Bytes::from_static(b"v"), TtlMs::from_secs(60))
            .await
            .unwrap();
        store
            .put_forever("tag:a", Bytes::from_static(b"[]"))
            .await
            .unwrap();

        store.flush_all().await.unwrap();
        assert!(store.get("k").await.is_err());
        assert!(store.get("tag:a").await.is_err());
    }
}

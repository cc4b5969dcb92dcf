//! In-process store doubles for unit tests.

use crate::ports::KeyValueStore;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use shared::{Error, Result, TtlMs};
use std::time::Instant;

/// Flat in-memory store with real TTL semantics, substituted for the
/// production adapter in tests.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: DashMap<String, (Bytes, Option<Instant>)>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) => entry.1.is_none_or(|deadline| Instant::now() < deadline),
            None => false,
        }
    }
}

#[async_trait]
impl KeyValueStore for MemStore {
    async fn get(&self, key: &str) -> Result<Bytes> {
        match self.entries.get(key) {
            Some(entry) if entry.1.is_none_or(|deadline| Instant::now() < deadline) => {
                Ok(entry.0.clone())
            }
            Some(_) => {
                drop(self.entries.remove(key));
                Err(Error::NotFound)
            }
            None => Err(Error::NotFound),
        }
    }

    async fn put(&self, key: &str, value: Bytes, ttl: TtlMs) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            (value, Some(Instant::now() + ttl.as_duration())),
        );
        Ok(())
    }

    async fn put_forever(&self, key: &str, value: Bytes) -> Result<()> {
        self.entries.insert(key.to_string(), (value, None));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.contains(key))
    }

    async fn flush_all(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Store double whose every operation fails, for outage-propagation tests.
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Bytes> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    async fn put(&self, _key: &str, _value: Bytes, _ttl: TtlMs) -> Result<()> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    async fn put_forever(&self, _key: &str, _value: Bytes) -> Result<()> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }

    async fn flush_all(&self) -> Result<()> {
        Err(Error::StoreUnavailable("connection refused".to_string()))
    }
}

use crate::ports::KeyValueStore;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::fmt;
use std::sync::Arc;

const TAG_PREFIX: &str = "tag:";
const KEY_PREFIX: &str = "key:";

pub const MAX_TAG_LEN: usize = 255;

/// A validated invalidation label. Tag names become store keys under the
/// reserved `tag:` namespace, so the charset is restricted to keep that
/// scheme collision-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::InvalidTag {
                tag: raw,
                reason: "tag must not be empty",
            });
        }
        if raw.len() > MAX_TAG_LEN {
            return Err(Error::InvalidTag {
                tag: raw,
                reason: "tag exceeds 255 bytes",
            });
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '{' | '}' | '.' | '-'))
        {
            return Err(Error::InvalidTag {
                tag: raw,
                reason: "tag may only contain [A-Za-z0-9_:{}.-]",
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn listing(id: u64) -> Self {
        Self(format!("listing:{id}"))
    }

    pub fn dealer(id: u64) -> Self {
        Self(format!("dealer:{id}"))
    }

    pub fn country(code: &str) -> Result<Self> {
        Self::new(format!("country:{code}"))
    }

    pub fn cars_list() -> Self {
        Self("cars_list".to_string())
    }

    pub fn facets() -> Self {
        Self("facets".to_string())
    }

    pub fn statistics() -> Self {
        Self("statistics".to_string())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Tag {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

/// Bidirectional tag index kept in the same flat store as the entries it
/// tracks. Forward sets live under `tag:<tag>`, reverse sets under
/// `key:<key>`, both forever-lived and JSON-encoded.
///
/// Read-modify-write of a set is not atomic against concurrent writers; a
/// concurrently added key can be lost to a last-writer-wins overwrite. The
/// consequence is a stale index entry, never corrupt data, and stale entries
/// are tolerated throughout (natural TTL expiry of an entry leaves its index
/// references behind until a flush prunes them).
#[derive(Clone)]
pub struct TagIndex {
    store: Arc<dyn KeyValueStore>,
}

impl TagIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Records `key` under every tag, forward and reverse. Idempotent.
    pub async fn tag_key(&self, key: &str, tags: &[Tag]) -> Result<()> {
        for tag in tags {
            let forward_key = format!("{TAG_PREFIX}{tag}");
            let mut keys = self.read_set(&forward_key).await?;
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
                self.write_set(&forward_key, &keys).await?;
            }
        }

        if !tags.is_empty() {
            let reverse_key = format!("{KEY_PREFIX}{key}");
            let mut recorded = self.read_set(&reverse_key).await?;
            let mut changed = false;
            for tag in tags {
                if !recorded.iter().any(|t| t == tag.as_str()) {
                    recorded.push(tag.as_str().to_string());
                    changed = true;
                }
            }
            if changed {
                self.write_set(&reverse_key, &recorded).await?;
            }
        }

        Ok(())
    }

    /// The (possibly stale) key set for a tag; empty if the tag was never
    /// used or has been cleared.
    pub async fn keys_for_tag(&self, tag: &Tag) -> Result<Vec<String>> {
        self.read_set(&format!("{TAG_PREFIX}{tag}")).await
    }

    /// Removes `key` from every forward set it appears in, deleting forward
    /// sets that become empty, then drops the reverse set. Idempotent: a
    /// second call finds no reverse set and does nothing.
    pub async fn untag(&self, key: &str) -> Result<()> {
        let reverse_key = format!("{KEY_PREFIX}{key}");
        let tags = self.read_set(&reverse_key).await?;

        for tag in &tags {
            let forward_key = format!("{TAG_PREFIX}{tag}");
            let mut keys = self.read_set(&forward_key).await?;
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.store.delete(&forward_key).await?;
            } else {
                self.write_set(&forward_key, &keys).await?;
            }
        }

        self.store.delete(&reverse_key).await?;
        Ok(())
    }

    /// Drops the forward set only. Reverse entries of the keys it referenced
    /// are pruned lazily on their own untag; forward lookups are the only
    /// reads that depend on this set, and a cleared tag resolves to nothing.
    pub async fn clear_tag(&self, tag: &Tag) -> Result<()> {
        self.store.delete(&format!("{TAG_PREFIX}{tag}")).await?;
        Ok(())
    }

    async fn read_set(&self, store_key: &str) -> Result<Vec<String>> {
        match self.store.get(store_key).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| Error::Internal(format!("corrupt index entry {store_key}: {e}"))),
            Err(Error::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn write_set(&self, store_key: &str, set: &[String]) -> Result<()> {
        let raw = serde_json::to_vec(set)
            .map_err(|e| Error::Internal(format!("index serialization: {e}")))?;
        self.store.put_forever(store_key, Bytes::from(raw)).await
    }
}

// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Cache miss or unknown entity. Not a failure of the store itself.
    #[error("not found")]
    NotFound,
    /// The underlying key-value store could not be reached or timed out.
    /// Propagated unmodified; retry policy belongs to the store client.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// A tag failed syntax validation before any store call was made.
    #[error("invalid tag `{tag}`: {reason}")]
    InvalidTag { tag: String, reason: &'static str },
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Time-to-live for a cache entry, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlMs(pub u64);

impl TtlMs {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_millis(self.0)
    }
}

pub mod config;

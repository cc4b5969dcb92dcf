//! Conditional-response negotiation over resolved payloads.
//!
//! The fingerprint hashes the response payload, not the cache key: it
//! reflects data freshness, not whether the lookup was a cache hit. A fresh
//! computation can still answer "not modified", and a cache hit can still
//! need a full body when the client sent no prior fingerprint.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 hex digest of a response payload. Byte-identical payloads produce
/// identical fingerprints across processes and restarts; no local salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(payload: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(payload)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Conditional {
    /// The caller's fingerprint matches the current payload; no body.
    NotModified { etag: Fingerprint },
    /// Full payload plus its fingerprint.
    Fresh { etag: Fingerprint, body: Bytes },
}

impl Conditional {
    pub fn etag(&self) -> &Fingerprint {
        match self {
            Conditional::NotModified { etag } | Conditional::Fresh { etag, .. } => etag,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, Conditional::NotModified { .. })
    }
}

/// Fingerprints `body` and short-circuits when the caller already holds the
/// same fingerprint (`If-None-Match`).
pub fn evaluate(body: Bytes, if_none_match: Option<&str>) -> Conditional {
    let etag = Fingerprint::of(&body);
    match if_none_match {
        Some(prior) if etag.matches(prior) => Conditional::NotModified { etag },
        _ => Conditional::Fresh { etag, body },
    }
}

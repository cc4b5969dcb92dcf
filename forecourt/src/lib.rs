//! Tag-indexed caching core for the listings backend.
//!
//! The store is a flat key-value abstraction with no native tagging; bulk
//! invalidation is built on top of it with a forward (`tag:` -> keys) and
//! reverse (`key:` -> tags) index kept in the same store.

pub mod cache;
pub mod catalog;
pub mod etag;
pub mod events;
pub mod invalidation;
pub mod listing;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

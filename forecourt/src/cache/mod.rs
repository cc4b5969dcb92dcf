pub mod key;
pub mod service;
pub mod tags;

pub use key::{CacheKeyBuilder, FilterValue};
pub use service::{CacheService, FlushOutcome, Remembered};
pub use tags::{Tag, TagIndex};

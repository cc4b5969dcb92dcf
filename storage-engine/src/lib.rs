mod moka_store;

pub use moka_store::MokaStore;

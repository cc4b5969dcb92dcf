use crate::repository::InMemoryListingRepository;
use forecourt::cache::CacheService;
use forecourt::catalog::{CatalogService, CatalogTtls};
use forecourt::events::ListingEvent;
use forecourt::invalidation::ListingObserver;
use shared::{TtlMs, config::Config};
use std::sync::Arc;
use storage_engine::MokaStore;
use tokio::sync::broadcast;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub cache: CacheService,
    pub repository: Arc<InMemoryListingRepository>,
    pub observer: Arc<ListingObserver>,
    pub event_channel: broadcast::Sender<ListingEvent>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let store = Arc::new(MokaStore::new("forecourt"));
        let cache = CacheService::new(store);
        let repository = Arc::new(InMemoryListingRepository::new());

        let ttls = CatalogTtls {
            browse: TtlMs::from_secs(config.browse_ttl_secs),
            show: TtlMs::from_secs(config.show_ttl_secs),
            facets: TtlMs::from_secs(config.facets_ttl_secs),
            statistics: TtlMs::from_secs(config.statistics_ttl_secs),
        };
        let catalog = Arc::new(CatalogService::with_ttls(
            repository.clone(),
            cache.clone(),
            ttls,
        ));

        // History events (price/status transitions), 1000 event buffer.
        let (event_tx, _event_rx) = broadcast::channel(1000);
        let observer = Arc::new(ListingObserver::with_event_broadcaster(
            cache.clone(),
            event_tx.clone(),
        ));

        Self {
            catalog,
            cache,
            repository,
            observer,
            event_channel: event_tx,
            config,
        }
    }
}

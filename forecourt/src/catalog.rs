//! Cached browse/show/facets/statistics orchestration over the listing
//! repository. All repository reads go through [`CacheService::remember`];
//! payloads are cached as serialized JSON so a hit never touches the
//! repository or re-serializes.

use crate::cache::key::BrowseQuery;
use crate::cache::{CacheKeyBuilder, CacheService, Tag};
use crate::listing::{BrowseFilters, FacetCounts, Listing, Page, SortSpec};
use crate::ports::ListingRepository;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shared::{Error, Result, TtlMs};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct CatalogTtls {
    pub browse: TtlMs,
    pub show: TtlMs,
    pub facets: TtlMs,
    pub statistics: TtlMs,
}

impl Default for CatalogTtls {
    fn default() -> Self {
        Self {
            browse: TtlMs::from_secs(300),
            show: TtlMs::from_secs(600),
            facets: TtlMs::from_secs(900),
            statistics: TtlMs::from_secs(1800),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowseRequest {
    pub filters: BrowseFilters,
    /// `None` means the default ordering; it is applied before key
    /// derivation, so omitted and explicit defaults share a key.
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub per_page: u32,
    pub include_facets: bool,
}

/// The cached browse shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsePage {
    pub cars: Page<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetCounts>,
}

/// A resolved payload plus the observability facts handlers put on the wire.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub body: Bytes,
    pub cache_key: String,
    pub hit: bool,
}

pub struct CatalogService {
    repo: Arc<dyn ListingRepository>,
    cache: CacheService,
    ttls: CatalogTtls,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ListingRepository>, cache: CacheService) -> Self {
        Self::with_ttls(repo, cache, CatalogTtls::default())
    }

    pub fn with_ttls(
        repo: Arc<dyn ListingRepository>,
        cache: CacheService,
        ttls: CatalogTtls,
    ) -> Self {
        Self { repo, cache, ttls }
    }

    pub async fn browse(&self, req: &BrowseRequest) -> Result<CachedPayload> {
        let sort = req.sort.clone().unwrap_or_else(SortSpec::latest_first);
        let query = BrowseQuery {
            filters: req.filters.to_filter_map(),
            sort: sort.0.clone(),
            page: req.page,
            per_page: req.per_page,
            include_facets: req.include_facets,
        };
        let key = CacheKeyBuilder::new("cars").build(&query)?;
        let tags = self.collection_tags(Tag::cars_list(), &req.filters);

        let remembered = self
            .cache
            .remember(&key, &tags, self.ttls.browse, || async {
                let cars = self
                    .repo
                    .browse(&req.filters, &sort, req.page, req.per_page)
                    .await?;
                let facets = if req.include_facets {
                    Some(self.facets(&req.filters).await?)
                } else {
                    None
                };
                to_json(&BrowsePage { cars, facets })
            })
            .await?;

        Ok(CachedPayload {
            body: remembered.value,
            cache_key: key,
            hit: remembered.hit,
        })
    }

    /// Single-listing lookup under the entity tag. An unknown id propagates
    /// `NotFound` and caches nothing.
    pub async fn show(&self, id: u64) -> Result<CachedPayload> {
        let key = format!("car:{id}");
        let tags = [Tag::listing(id)];

        let remembered = self
            .cache
            .remember(&key, &tags, self.ttls.show, || async {
                let listing = self.repo.find(id).await?.ok_or(Error::NotFound)?;
                to_json(&listing)
            })
            .await?;

        Ok(CachedPayload {
            body: remembered.value,
            cache_key: key,
            hit: remembered.hit,
        })
    }

    /// Facets are cached separately from the pages that embed them, under
    /// their own key and the `facets` tag.
    pub async fn facets(&self, filters: &BrowseFilters) -> Result<FacetCounts> {
        let key = CacheKeyBuilder::new("car_facets").build(&filters.to_filter_map())?;
        let tags = self.collection_tags(Tag::facets(), filters);

        let remembered = self
            .cache
            .remember(&key, &tags, self.ttls.facets, || async {
                to_json(&self.repo.facet_counts(filters).await?)
            })
            .await?;

        serde_json::from_slice(&remembered.value)
            .map_err(|e| Error::Internal(format!("corrupt cached facets: {e}")))
    }

    pub async fn statistics(&self, filters: &BrowseFilters) -> Result<CachedPayload> {
        let key = CacheKeyBuilder::new("car_statistics").build(&filters.to_filter_map())?;
        let tags = self.collection_tags(Tag::statistics(), filters);

        let remembered = self
            .cache
            .remember(&key, &tags, self.ttls.statistics, || async {
                to_json(&self.repo.statistics(filters).await?)
            })
            .await?;

        Ok(CachedPayload {
            body: remembered.value,
            cache_key: key,
            hit: remembered.hit,
        })
    }

    fn collection_tags(&self, aggregate: Tag, filters: &BrowseFilters) -> Vec<Tag> {
        let mut tags = vec![aggregate];
        if let Some(cc) = &filters.country_code {
            if let Ok(tag) = Tag::country(cc) {
                tags.push(tag);
            }
        }
        tags
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| Error::Internal(format!("payload serialization: {e}")))
}

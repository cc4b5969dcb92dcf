use crate::models::{CreateListingRequest, UpdateListingRequest};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use forecourt::listing::{
    BrowseFilters, FacetCounts, Listing, ListingStatistics, ListingStatus, Page, SortDirection,
    SortSpec,
};
use forecourt::ports::ListingRepository;
use shared::Result;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// In-process listing persistence. Stands in for the real database behind
/// the `ListingRepository` port; soft-deletes so listings can be restored.
#[derive(Debug, Default)]
pub struct InMemoryListingRepository {
    live: DashMap<u64, Listing>,
    trashed: DashMap<u64, Listing>,
    next_id: AtomicU64,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self {
            live: DashMap::new(),
            trashed: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn create(&self, req: CreateListingRequest) -> Listing {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let listing = Listing {
            id,
            dealer_id: req.dealer_id,
            country_code: req.country_code,
            make: req.make,
            model: req.model,
            year: req.year,
            price_cents: req.price_cents,
            status: req.status.unwrap_or(ListingStatus::Active),
            listed_at: req.listed_at.unwrap_or_else(Utc::now),
        };
        self.live.insert(id, listing.clone());
        listing
    }

    /// Applies the patch and returns the before/after pair, or `None` for an
    /// unknown id.
    pub fn update(&self, id: u64, req: UpdateListingRequest) -> Option<(Listing, Listing)> {
        let mut entry = self.live.get_mut(&id)?;
        let before = entry.clone();
        if let Some(dealer_id) = req.dealer_id {
            entry.dealer_id = Some(dealer_id);
        }
        if let Some(cc) = req.country_code {
            entry.country_code = Some(cc);
        }
        if let Some(make) = req.make {
            entry.make = make;
        }
        if let Some(model) = req.model {
            entry.model = model;
        }
        if let Some(year) = req.year {
            entry.year = year;
        }
        if let Some(price) = req.price_cents {
            entry.price_cents = price;
        }
        if let Some(status) = req.status {
            entry.status = status;
        }
        Some((before, entry.clone()))
    }

    pub fn remove(&self, id: u64) -> Option<Listing> {
        let (_, listing) = self.live.remove(&id)?;
        self.trashed.insert(id, listing.clone());
        Some(listing)
    }

    pub fn restore(&self, id: u64) -> Option<Listing> {
        let (_, listing) = self.trashed.remove(&id)?;
        self.live.insert(id, listing.clone());
        Some(listing)
    }

    fn filtered(&self, filters: &BrowseFilters) -> Vec<Listing> {
        self.live
            .iter()
            .filter(|entry| filters.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

fn compare_by(a: &Listing, b: &Listing, column: &str) -> Ordering {
    match column {
        "listed_at" => a.listed_at.cmp(&b.listed_at),
        "price_cents" => a.price_cents.cmp(&b.price_cents),
        "year" => a.year.cmp(&b.year),
        "make" => a.make.cmp(&b.make),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn browse(
        &self,
        filters: &BrowseFilters,
        sort: &SortSpec,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Listing>> {
        let mut matched = self.filtered(filters);
        matched.sort_by(|a, b| {
            for (column, direction) in &sort.0 {
                let mut ord = compare_by(a, b, column);
                if *direction == SortDirection::Desc {
                    ord = ord.reverse();
                }
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            // Stable tiebreak so pagination never straddles duplicates.
            a.id.cmp(&b.id)
        });

        let total = matched.len() as u64;
        let per_page = per_page.max(1);
        let offset = (page.max(1) - 1) as usize * per_page as usize;
        let items: Vec<Listing> = matched
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Ok(Page::new(items, total, page, per_page))
    }

    async fn find(&self, id: u64) -> Result<Option<Listing>> {
        Ok(self.live.get(&id).map(|entry| entry.value().clone()))
    }

    async fn facet_counts(&self, filters: &BrowseFilters) -> Result<FacetCounts> {
        // Facet over everything except the dimensions being faceted on, so
        // a make filter still shows the counts of the other makes.
        let mut base = filters.clone();
        base.make = None;
        base.year_min = None;
        base.year_max = None;

        let mut makes: BTreeMap<String, u64> = BTreeMap::new();
        let mut years: BTreeMap<i32, u64> = BTreeMap::new();
        for listing in self.filtered(&base) {
            *makes.entry(listing.make).or_insert(0) += 1;
            *years.entry(listing.year).or_insert(0) += 1;
        }
        Ok(FacetCounts { makes, years })
    }

    async fn statistics(&self, filters: &BrowseFilters) -> Result<ListingStatistics> {
        let matched = self.filtered(filters);
        if matched.is_empty() {
            return Ok(ListingStatistics::default());
        }

        let total = matched.len() as u64;
        let price_sum: i64 = matched.iter().map(|l| l.price_cents).sum();
        let price_min = matched.iter().map(|l| l.price_cents).min();
        let price_max = matched.iter().map(|l| l.price_cents).max();
        let year_min = matched.iter().map(|l| l.year).min();
        let year_max = matched.iter().map(|l| l.year).max();
        let makes: BTreeSet<&str> = matched.iter().map(|l| l.make.as_str()).collect();
        let countries: BTreeSet<&str> = matched
            .iter()
            .filter_map(|l| l.country_code.as_deref())
            .collect();

        Ok(ListingStatistics {
            total_cars: total,
            average_price_cents: price_sum / total as i64,
            price_range_cents: price_min.zip(price_max),
            year_range: year_min.zip(year_max),
            makes_count: makes.len() as u64,
            countries_count: countries.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(make: &str, price_cents: i64, year: i32) -> CreateListingRequest {
        CreateListingRequest {
            dealer_id: Some(1),
            country_code: Some("US".to_string()),
            make: make.to_string(),
            model: "M".to_string(),
            year,
            price_cents,
            status: None,
            listed_at: None,
        }
    }

    #[tokio::test]
    async fn browse_filters_sorts_and_paginates() {
        let repo = InMemoryListingRepository::new();
        repo.create(create_request("Toyota", 3_000_000, 2022));
        repo.create(create_request("Toyota", 1_000_000, 2018));
        repo.create(create_request("Honda", 2_000_000, 2020));

        let filters = BrowseFilters {
            make: Some("Toyota".to_string()),
            ..Default::default()
        };
        let mut columns = BTreeMap::new();
        columns.insert("price_cents".to_string(), SortDirection::Asc);
        let page = repo
            .browse(&filters, &SortSpec(columns), 1, 10)
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].price_cents, 1_000_000);
        assert_eq!(page.items[1].price_cents, 3_000_000);
    }

    #[tokio::test]
    async fn pagination_windows_do_not_overlap() {
        let repo = InMemoryListingRepository::new();
        for i in 0..5 {
            repo.create(create_request("Toyota", 1_000_000 + i, 2020));
        }

        let sort = SortSpec::latest_first();
        let first = repo
            .browse(&BrowseFilters::default(), &sort, 1, 2)
            .await
            .unwrap();
        let second = repo
            .browse(&BrowseFilters::default(), &sort, 2, 2)
            .await
            .unwrap();

        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(first.last_page, 3);
        for a in &first.items {
            assert!(second.items.iter().all(|b| b.id != a.id));
        }
    }

    #[tokio::test]
    async fn soft_delete_and_restore_round_trip() {
        let repo = InMemoryListingRepository::new();
        let listing = repo.create(create_request("Toyota", 1_000_000, 2020));

        assert!(repo.remove(listing.id).is_some());
        assert!(repo.find(listing.id).await.unwrap().is_none());

        assert!(repo.restore(listing.id).is_some());
        assert!(repo.find(listing.id).await.unwrap().is_some());

        // A second restore has nothing to restore.
        assert!(repo.restore(listing.id).is_none());
    }

    #[tokio::test]
    async fn facets_ignore_the_faceted_dimensions() {
        let repo = InMemoryListingRepository::new();
        repo.create(create_request("Toyota", 1_000_000, 2020));
        repo.create(create_request("Honda", 2_000_000, 2021));

        let filters = BrowseFilters {
            make: Some("Toyota".to_string()),
            ..Default::default()
        };
        let facets = repo.facet_counts(&filters).await.unwrap();
        assert_eq!(facets.makes.get("Toyota"), Some(&1));
        assert_eq!(facets.makes.get("Honda"), Some(&1));
    }

    #[tokio::test]
    async fn statistics_aggregate_the_filtered_set() {
        let repo = InMemoryListingRepository::new();
        repo.create(create_request("Toyota", 1_000_000, 2018));
        repo.create(create_request("Honda", 3_000_000, 2022));

        let stats = repo.statistics(&BrowseFilters::default()).await.unwrap();
        assert_eq!(stats.total_cars, 2);
        assert_eq!(stats.average_price_cents, 2_000_000);
        assert_eq!(stats.price_range_cents, Some((1_000_000, 3_000_000)));
        assert_eq!(stats.year_range, Some((2018, 2022)));
        assert_eq!(stats.makes_count, 2);
        assert_eq!(stats.countries_count, 1);
    }
}

use crate::listing::SortDirection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{Error, Result};
use std::collections::BTreeMap;

/// A single filter value as it participates in key derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Flag(bool),
    List(Vec<String>),
}

/// The full parameter tuple a browse result is keyed on. `BTreeMap` fields
/// canonicalize map ordering, so insertion order never leaks into the key.
///
/// `page` is part of the key alongside `per_page`; two pages of the same
/// query are distinct cached shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseQuery {
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: BTreeMap<String, SortDirection>,
    pub page: u32,
    pub per_page: u32,
    pub include_facets: bool,
}

/// Derives canonical cache keys: deterministic serialization of the
/// parameter set, SHA-256 digest, human-readable namespace prefix.
///
/// Pure and I/O-free. Performs no defaulting; callers must apply defaults
/// (e.g. the default sort) before building a key.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Builds `<namespace>:<sha256 hex>` over the canonical serialization of
    /// `params`. The namespace keeps keys debuggable and makes cross-namespace
    /// collisions impossible even if the digest collided.
    pub fn build<T: Serialize>(&self, params: &T) -> Result<String> {
        let canonical = serde_json::to_vec(params)
            .map_err(|e| Error::Internal(format!("cache key serialization: {e}")))?;
        let digest = Sha256::digest(&canonical);
        Ok(format!("{}:{}", self.namespace, hex::encode(digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(
        filters: Vec<(&str, FilterValue)>,
        sort: Vec<(&str, SortDirection)>,
        page: u32,
        per_page: u32,
        include_facets: bool,
    ) -> BrowseQuery {
        BrowseQuery {
            filters: filters
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            sort: sort.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            page,
            per_page,
            include_facets,
        }
    }

    #[test]
    fn key_carries_namespace_prefix() {
        let key = CacheKeyBuilder::new("cars")
            .build(&query(vec![], vec![], 1, 20, false))
            .unwrap();
        assert!(key.starts_with("cars:"));
        assert_eq!(key.len(), "cars:".len() + 64);
    }

    #[test]
    fn identical_parameters_build_identical_keys() {
        let builder = CacheKeyBuilder::new("cars");
        let a = query(
            vec![
                ("make", FilterValue::Text("Toyota".into())),
                ("year_min", FilterValue::Int(2018)),
            ],
            vec![("listed_at", SortDirection::Desc)],
            1,
            20,
            false,
        );
        // Same parameters inserted in the opposite order.
        let b = query(
            vec![
                ("year_min", FilterValue::Int(2018)),
                ("make", FilterValue::Text("Toyota".into())),
            ],
            vec![("listed_at", SortDirection::Desc)],
            1,
            20,
            false,
        );
        assert_eq!(builder.build(&a).unwrap(), builder.build(&b).unwrap());
    }

    #[test]
    fn any_semantic_difference_changes_the_key() {
        let builder = CacheKeyBuilder::new("cars");
        let base = query(
            vec![("make", FilterValue::Text("Toyota".into()))],
            vec![("listed_at", SortDirection::Desc)],
            1,
            20,
            false,
        );
        let variants = [
            query(
                vec![("make", FilterValue::Text("Honda".into()))],
                vec![("listed_at", SortDirection::Desc)],
                1,
                20,
                false,
            ),
            query(
                vec![("make", FilterValue::Text("Toyota".into()))],
                vec![("listed_at", SortDirection::Asc)],
                1,
                20,
                false,
            ),
            query(
                vec![("make", FilterValue::Text("Toyota".into()))],
                vec![("listed_at", SortDirection::Desc)],
                2,
                20,
                false,
            ),
            query(
                vec![("make", FilterValue::Text("Toyota".into()))],
                vec![("listed_at", SortDirection::Desc)],
                1,
                50,
                false,
            ),
            query(
                vec![("make", FilterValue::Text("Toyota".into()))],
                vec![("listed_at", SortDirection::Desc)],
                1,
                20,
                true,
            ),
        ];
        let base_key = builder.build(&base).unwrap();
        for variant in &variants {
            assert_ne!(base_key, builder.build(variant).unwrap());
        }
    }

    #[test]
    fn namespaces_partition_the_key_space() {
        let q = query(vec![], vec![], 1, 20, false);
        let cars = CacheKeyBuilder::new("cars").build(&q).unwrap();
        let facets = CacheKeyBuilder::new("car_facets").build(&q).unwrap();
        assert_ne!(cars, facets);
    }

    fn arb_filter_value() -> impl Strategy<Value = FilterValue> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(FilterValue::Text),
            any::<i32>().prop_map(|n| FilterValue::Int(n as i64)),
            any::<bool>().prop_map(FilterValue::Flag),
            proptest::collection::vec("[a-z]{1,6}", 0..4).prop_map(FilterValue::List),
        ]
    }

    proptest! {
        /// Insertion order of filters never affects the derived key.
        #[test]
        fn key_is_invariant_under_filter_permutation(
            entries in proptest::collection::btree_map("[a-z_]{1,10}", arb_filter_value(), 0..8),
            permutation_seed in any::<u64>(),
            page in 1u32..100,
            per_page in 1u32..100,
        ) {
            let builder = CacheKeyBuilder::new("cars");
            let ordered: Vec<(String, FilterValue)> = entries.iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            // Deterministically shuffle the entries before re-inserting.
            let mut shuffled = ordered.clone();
            let mut seed = permutation_seed;
            for i in (1..shuffled.len()).rev() {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (seed >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            let a = BrowseQuery {
                filters: ordered.into_iter().collect(),
                sort: BTreeMap::new(),
                page,
                per_page,
                include_facets: false,
            };
            let b = BrowseQuery {
                filters: shuffled.into_iter().collect(),
                sort: BTreeMap::new(),
                page,
                per_page,
                include_facets: false,
            };
            prop_assert_eq!(builder.build(&a).unwrap(), builder.build(&b).unwrap());
        }

        /// Distinct filter maps produce distinct keys.
        #[test]
        fn distinct_filters_produce_distinct_keys(
            a in proptest::collection::btree_map("[a-z_]{1,10}", arb_filter_value(), 0..6),
            b in proptest::collection::btree_map("[a-z_]{1,10}", arb_filter_value(), 0..6),
        ) {
            prop_assume!(a != b);
            let builder = CacheKeyBuilder::new("cars");
            let qa = BrowseQuery { filters: a, sort: BTreeMap::new(), page: 1, per_page: 20, include_facets: false };
            let qb = BrowseQuery { filters: b, sort: BTreeMap::new(), page: 1, per_page: 20, include_facets: false };
            prop_assert_ne!(builder.build(&qa).unwrap(), builder.build(&qb).unwrap());
        }
    }
}

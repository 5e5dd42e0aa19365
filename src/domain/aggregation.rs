//! 상품 목록 집계 엔진
//!
//! Turns a raw list of normalized listings into deduplicated, filterable,
//! sortable, selectable view data. Every operation here is pure: inputs in,
//! fresh values out, no IO and no shared state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::{
    GroupKey, GroupedProduct, PriceRange, ProductRecord, ProductVariant,
};

/// Which search surface produced the records being filtered.
///
/// Price bounds only apply to category browsing — keyword and deep-link
/// results are not price-annotated consistently enough to filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContext {
    Keyword,
    Category,
    DeepLink,
}

/// View filter options, injected by the caller (never read from ambient state).
#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    pub rocket_only: bool,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub context: SearchContext,
}

impl FilterOptions {
    pub fn for_context(context: SearchContext) -> Self {
        Self { rocket_only: false, price_min: None, price_max: None, context }
    }
}

/// Price sort order for the current view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSort {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
    /// Input order untouched — not an implicit sort.
    #[default]
    #[serde(rename = "none")]
    Unsorted,
}

/// Partition records by product identity into grouped products.
///
/// Groups keep first-appearance order; within a group variants are sorted
/// ascending by price with ties keeping input order. The cheapest variant
/// becomes the group's canonical `main_item`.
pub fn group(records: &[ProductRecord]) -> Vec<GroupedProduct> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut partitions: HashMap<GroupKey, Vec<&ProductRecord>> = HashMap::new();

    for record in records {
        let key = record.group_key();
        partitions
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .map(|key| {
            let mut members = partitions.remove(&key).unwrap_or_default();
            // sort_by_key는 stable — 동일 가격은 입력 순서 유지
            members.sort_by_key(|r| r.price);

            let main_item = (*members[0]).clone();
            let min = main_item.price;
            let max = members.last().map_or(min, |r| r.price);

            let variants = members
                .into_iter()
                .map(|record| {
                    let (vendor_item_id, item_id) =
                        ProductVariant::extract_variant_params(&record.url);
                    ProductVariant {
                        vendor_item_id,
                        item_id,
                        price_difference: record.price as i64 - min as i64,
                        record: record.clone(),
                    }
                })
                .collect::<Vec<_>>();

            GroupedProduct {
                key,
                main_item,
                variant_count: variants.len(),
                price_range: PriceRange { min, max },
                variants,
            }
        })
        .collect()
}

/// Flatten grouped products back into a display list of representatives.
///
/// Groups with multiple variants get the option count and price range
/// appended to the display name, on a copy — the group itself is untouched —
/// so downstream code cannot mistake the row for a single exact listing.
pub fn flatten(groups: &[GroupedProduct]) -> Vec<ProductRecord> {
    groups
        .iter()
        .map(|g| {
            let mut record = g.main_item.clone();
            if g.variant_count > 1 {
                record.name = format!(
                    "{} (옵션 {}개, {}원~{}원)",
                    record.name, g.variant_count, g.price_range.min, g.price_range.max
                );
            }
            record
        })
        .collect()
}

/// Flatten grouped products into all of their variant records, losslessly.
///
/// Unlike [`flatten`] this keeps every listing (group order, then price
/// order within a group), so re-grouping the result reconstructs the same
/// groups — nothing lost, nothing fabricated.
pub fn flatten_variants(groups: &[GroupedProduct]) -> Vec<ProductRecord> {
    groups
        .iter()
        .flat_map(|g| g.variants.iter().map(|v| v.record.clone()))
        .collect()
}

/// Apply rocket-delivery and price-bound filters to a record list.
pub fn filter(records: &[ProductRecord], options: &FilterOptions) -> Vec<ProductRecord> {
    records
        .iter()
        .filter(|r| !options.rocket_only || r.is_rocket_delivery)
        .filter(|r| {
            if options.context != SearchContext::Category {
                return true;
            }
            let above_min = options.price_min.is_none_or(|min| r.price >= min);
            let below_max = options.price_max.is_none_or(|max| r.price <= max);
            above_min && below_max
        })
        .cloned()
        .collect()
}

/// Stable price sort; [`PriceSort::Unsorted`] returns the input order as-is.
pub fn sort_by_price(records: &[ProductRecord], order: PriceSort) -> Vec<ProductRecord> {
    let mut sorted: Vec<ProductRecord> = records.to_vec();
    match order {
        PriceSort::Ascending => sorted.sort_by_key(|r| r.price),
        PriceSort::Descending => sorted.sort_by_key(|r| std::cmp::Reverse(r.price)),
        PriceSort::Unsorted => {}
    }
    sorted
}

/// Selection IDs for the currently visible set, in display order.
pub fn select_all_ids(records: &[ProductRecord]) -> Vec<String> {
    records.iter().map(|r| r.group_key().to_string()).collect()
}

//! Property tests for the aggregation invariants: price ranges, grouping
//! idempotence and the select-all toggle law.

use proptest::prelude::*;
use rstest::rstest;

use linkpick::domain::aggregation::{self, PriceSort};
use linkpick::domain::product::ProductRecord;
use linkpick::domain::selection::SelectionSet;

fn make_record(product_id: Option<i64>, price: u64, index: usize) -> ProductRecord {
    ProductRecord {
        product_id,
        name: format!("상품 {index}"),
        price,
        image_url: String::new(),
        url: format!("https://shop.example.com/p/{index}"),
        category_name: None,
        is_rocket_delivery: index % 2 == 0,
        is_free_shipping: false,
    }
}

fn arbitrary_records() -> impl Strategy<Value = Vec<ProductRecord>> {
    // 작은 id 공간을 써서 그룹 충돌이 실제로 일어나게 한다
    prop::collection::vec((prop::option::of(1i64..6), 0u64..100_000), 0..40).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (id, price))| make_record(id, price, index))
            .collect()
    })
}

proptest! {
    #[test]
    fn price_range_bounds_every_variant(records in arbitrary_records()) {
        let groups = aggregation::group(&records);

        for g in &groups {
            prop_assert_eq!(g.price_range.min, g.main_item.price);
            prop_assert_eq!(g.variant_count, g.variants.len());
            prop_assert!(g.variant_count >= 1);
            for v in &g.variants {
                prop_assert!(g.price_range.min <= v.record.price);
                prop_assert!(v.record.price <= g.price_range.max);
                prop_assert_eq!(
                    v.price_difference,
                    v.record.price as i64 - g.price_range.min as i64
                );
            }
        }

        // 그룹화는 항목을 잃지도, 만들어내지도 않는다
        let total: usize = groups.iter().map(|g| g.variant_count).sum();
        prop_assert_eq!(total, records.len());
    }

    #[test]
    fn grouping_is_idempotent_over_lossless_flatten(records in arbitrary_records()) {
        let groups = aggregation::group(&records);
        let regrouped = aggregation::group(&aggregation::flatten_variants(&groups));

        prop_assert_eq!(groups.len(), regrouped.len());
        for (before, after) in groups.iter().zip(regrouped.iter()) {
            prop_assert_eq!(&before.key, &after.key);
            prop_assert_eq!(before.variant_count, after.variant_count);
            prop_assert_eq!(before.price_range, after.price_range);
        }
    }

    #[test]
    fn toggle_select_all_twice_is_identity(
        raw_ids in prop::collection::vec("[a-z]{1,6}", 1..12)
    ) {
        let mut ids: Vec<String> = raw_ids;
        ids.sort();
        ids.dedup();

        // 토글로부터 유도된 두 상태: 빈 선택과 전체 선택
        let empty = SelectionSet::new();
        let full = empty.toggle_select_all(&ids);
        prop_assert_eq!(full.ids(), &ids[..]);

        prop_assert_eq!(full.toggle_select_all(&ids), empty.clone());
        prop_assert_eq!(
            empty.toggle_select_all(&ids).toggle_select_all(&ids),
            empty
        );
    }

    #[test]
    fn sorting_preserves_the_multiset(records in arbitrary_records()) {
        let sorted = aggregation::sort_by_price(&records, PriceSort::Ascending);
        prop_assert_eq!(sorted.len(), records.len());
        prop_assert!(sorted.windows(2).all(|w| w[0].price <= w[1].price));

        let untouched = aggregation::sort_by_price(&records, PriceSort::Unsorted);
        prop_assert_eq!(untouched, records);
    }
}

#[rstest]
#[case(PriceSort::Ascending, &[20, 50, 80])]
#[case(PriceSort::Descending, &[80, 50, 20])]
#[case(PriceSort::Unsorted, &[50, 20, 80])]
fn sort_orders(#[case] order: PriceSort, #[case] expected: &[u64]) {
    let records = vec![
        make_record(Some(1), 50, 0),
        make_record(Some(2), 20, 1),
        make_record(Some(3), 80, 2),
    ];
    let sorted = aggregation::sort_by_price(&records, order);
    let prices: Vec<u64> = sorted.iter().map(|r| r.price).collect();
    assert_eq!(prices, expected);
}

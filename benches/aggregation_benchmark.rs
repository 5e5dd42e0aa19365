//! 집계 엔진 핫패스 벤치마크
//!
//! 그룹화는 검색 응답이 바뀔 때마다 전체 재계산되므로 목록 크기에 대한
//! 처리량을 추적한다.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use linkpick::domain::aggregation;
use linkpick::domain::product::ProductRecord;

fn synthetic_listings(count: usize) -> Vec<ProductRecord> {
    (0..count)
        .map(|i| ProductRecord {
            // 4개 중 1개는 productId 없이 URL 키로 그룹화된다
            product_id: if i % 4 == 0 { None } else { Some((i % 500) as i64) },
            name: format!("상품 {i}"),
            price: ((i * 7919) % 100_000) as u64,
            image_url: String::new(),
            url: format!("https://shop.example.com/p/{i}?vendorItemId=v{i}&itemId=i{i}"),
            category_name: Some("벤치마크".into()),
            is_rocket_delivery: i % 3 == 0,
            is_free_shipping: false,
        })
        .collect()
}

fn bench_group(c: &mut Criterion) {
    let mut group_bench = c.benchmark_group("aggregation");

    for size in [100usize, 1_000, 10_000] {
        let records = synthetic_listings(size);
        group_bench.bench_function(format!("group_{size}"), |b| {
            b.iter(|| aggregation::group(black_box(&records)));
        });
    }

    let records = synthetic_listings(1_000);
    let groups = aggregation::group(&records);
    group_bench.bench_function("flatten_1000", |b| {
        b.iter(|| aggregation::flatten(black_box(&groups)));
    });

    group_bench.finish();
}

criterion_group!(benches, bench_group);
criterion_main!(benches);

//! Performance benchmarks for sift-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use sift_engine::{annotate_entries, prepare_entries, CollectionConfig, Registry};

fn create_test_registry() -> Registry {
    Registry::new().with_collection(
        CollectionConfig::new("restaurant")
            .index_name("my_restaurant")
            .filter_entry(|entry| Ok(entry["published"] == true))
            .transform_entry(|mut entry| {
                let names: Vec<Value> = entry["categories"]
                    .as_array()
                    .map(|c| c.iter().map(|c| c["name"].clone()).collect())
                    .unwrap_or_default();
                entry["categories"] = Value::Array(names);
                Ok(entry)
            }),
    )
}

fn create_entries(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": i,
                "documentId": format!("doc{i}"),
                "published": i % 4 != 0,
                "name": format!("Restaurant {i}"),
                "categories": [{"name": "Italian"}, {"name": "Pizza"}],
            })
        })
        .collect()
}

fn bench_annotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotate");
    let collection = "restaurant".to_string();

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("entries", size), &size, |b, &size| {
            let entries = create_entries(size);
            b.iter(|| annotate_entries(black_box(&collection), None, entries.clone()))
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let registry = create_test_registry();

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("prepare", size), &size, |b, &size| {
            let entries = create_entries(size);
            b.iter(|| prepare_entries(black_box(&registry), "restaurant", entries.clone()))
        });
    }

    // Unconfigured collections skip filter and transform
    group.bench_function("prepare_passthrough_1000", |b| {
        let entries = create_entries(1000);
        b.iter(|| prepare_entries(black_box(&registry), "movies", entries.clone()))
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut registry = Registry::new();
    for i in 0..100 {
        registry.register(
            CollectionConfig::new(format!("c{i}")).index_name(format!("i{}", i % 10)),
        );
    }

    c.bench_function("collections_sharing_index", |b| {
        b.iter(|| registry.collections_sharing_index(black_box("i3")))
    });
}

criterion_group!(benches, bench_annotate, bench_pipeline, bench_registry);
criterion_main!(benches);

//! Performance benchmarks for reelrack-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reelrack_engine::{
    bulk, CatalogQuery, CatalogRecord, CatalogStore, Genre, GenreFilter, Kind, KindFilter,
    Mutation, NewRecord, RecordFields, RecordPatch, SortKey,
};

fn catalog(size: usize) -> Vec<CatalogRecord> {
    (0..size)
        .map(|i| {
            let kind = if i % 3 == 0 { Kind::Series } else { Kind::Movie };
            let genre = Genre::ALL[i % Genre::ALL.len()];
            let mut fields = RecordFields::new(format!("Title {i}"), kind, 1950 + (i % 75) as i32)
                .with_genres([genre]);
            fields.cast_summary = format!("Actor {} and Actor {}", i % 97, i % 89);
            fields.description = "A story about somebody doing something".into();
            CatalogRecord::new(format!("t-{i}"), fields, None, i as u64)
        })
        .collect()
}

fn bench_store_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_operations");

    group.bench_function("apply_create", |b| {
        let mut store = CatalogStore::new();
        let mut id = 0u64;

        b.iter(|| {
            id += 1;
            let op = Mutation::Create(NewRecord::new(
                format!("t-{id}"),
                RecordFields::new("Benchmark", Kind::Movie, 2000),
                None,
            ));
            store.apply(black_box(op), black_box(id))
        })
    });

    group.bench_function("apply_merge", |b| {
        let mut store = CatalogStore::from_records(catalog(1000));
        let mut ts = 10_000u64;

        b.iter(|| {
            ts += 1;
            let patch = RecordPatch {
                description: Some("updated".into()),
                ..Default::default()
            };
            store.apply(black_box(Mutation::merge("t-500", patch)), black_box(ts))
        })
    });

    for size in [100, 1000, 10000] {
        let store = CatalogStore::from_records(catalog(size));
        group.bench_with_input(BenchmarkId::new("snapshot", size), &store, |b, store| {
            b.iter(|| store.snapshot())
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for size in [100, 1000, 10000] {
        let records = catalog(size);

        let default_query = CatalogQuery::new();
        group.bench_with_input(
            BenchmarkId::new("newest_first", size),
            &records,
            |b, records| b.iter(|| default_query.run(black_box(records))),
        );

        let text_query = CatalogQuery::new()
            .with_text("actor 42")
            .with_sort(SortKey::TitleAsc);
        group.bench_with_input(
            BenchmarkId::new("text_title_sort", size),
            &records,
            |b, records| b.iter(|| text_query.run(black_box(records))),
        );

        let filtered = CatalogQuery::new()
            .with_kind(KindFilter::Series)
            .with_genre(GenreFilter::Only(Genre::Drama));
        group.bench_with_input(
            BenchmarkId::new("kind_genre_filter", size),
            &records,
            |b, records| b.iter(|| filtered.run(black_box(records))),
        );
    }

    group.finish();
}

fn bench_bulk(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk");

    for size in [100, 1000] {
        let records = catalog(size);
        group.bench_with_input(BenchmarkId::new("export", size), &records, |b, records| {
            b.iter(|| bulk::export_json(black_box(records)))
        });

        let text = bulk::export_json(&records).unwrap();
        group.bench_with_input(BenchmarkId::new("parse_import", size), &text, |b, text| {
            b.iter(|| bulk::parse_import(black_box(text)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_store_operations, bench_query, bench_bulk);
criterion_main!(benches);

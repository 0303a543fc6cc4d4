//! Propagation benchmarks for rowconv
//!
//! These benchmarks measure row mapping throughput for scalar, flat record and
//! nested record destinations, and the cost of a first compilation against a
//! cached plan.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowconv::{record, ColumnType, DataType, Mapper, MemoryRows, OwnedValue};

record! {
    #[derive(Debug, Default)]
    struct Flat {
        id: i64,
        name: String,
        score: Option<f64>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Meta {
        score: Option<f64>,
    }
}

record! {
    #[derive(Debug, Default)]
    struct Nested {
        id: i64,
        name: String,
        meta: Option<Box<Meta>>,
    }
}

fn columns() -> Vec<ColumnType> {
    vec![
        ColumnType::new("id", DataType::Int8),
        ColumnType::new("name", DataType::Text),
        ColumnType::new("score", DataType::Float8),
    ]
}

fn rows(count: usize) -> MemoryRows {
    MemoryRows::new(columns()).with_rows((0..count).map(|i| {
        vec![
            OwnedValue::Int(i as i64),
            OwnedValue::Text(format!("row-{i}")),
            if i % 3 == 0 {
                OwnedValue::Null
            } else {
                OwnedValue::Float(i as f64 / 2.0)
            },
        ]
    }))
}

fn id_rows(count: usize) -> MemoryRows {
    MemoryRows::new(vec![ColumnType::new("id", DataType::Int8)])
        .with_rows((0..count).map(|i| vec![OwnedValue::Int(i as i64)]))
}

fn bench_element_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("element_shapes");
    let mapper = Mapper::new();

    for count in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("scalar", count), &count, |b, &count| {
            b.iter_batched(
                || id_rows(count),
                |rows| {
                    let mut out: Vec<i64> = Vec::with_capacity(count);
                    mapper.propagate(&mut out, rows).unwrap();
                    black_box(out)
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("flat_record", count), &count, |b, &count| {
            b.iter_batched(
                || rows(count),
                |rows| {
                    let mut out: Vec<Flat> = Vec::with_capacity(count);
                    mapper.propagate(&mut out, rows).unwrap();
                    black_box(out)
                },
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("nested_record", count), &count, |b, &count| {
            b.iter_batched(
                || rows(count),
                |rows| {
                    let mut out: Vec<Box<Nested>> = Vec::with_capacity(count);
                    mapper.propagate(&mut out, rows).unwrap();
                    black_box(out)
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_plan_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_cache");

    group.bench_function("cold_compile", |b| {
        b.iter_batched(
            || (Mapper::new(), rows(1)),
            |(mapper, rows)| {
                let mut out: Vec<Nested> = Vec::new();
                mapper.propagate(&mut out, rows).unwrap();
                black_box(out)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    let warm = Mapper::new();
    let mut seed: Vec<Nested> = Vec::new();
    warm.propagate(&mut seed, rows(1)).unwrap();
    group.bench_function("warm_hit", |b| {
        b.iter_batched(
            || rows(1),
            |rows| {
                let mut out: Vec<Nested> = Vec::new();
                warm.propagate(&mut out, rows).unwrap();
                black_box(out)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_element_shapes, bench_plan_cache);
criterion_main!(benches);

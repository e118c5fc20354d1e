//! Pagination benchmarks for slugline-paginate.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slugline_paginate::{
    pack_elements, Element, ElementKind, EngineConfig, PaginationEngine, DEFAULT_PAGE_HEIGHT,
};
use std::time::Duration;

fn screenplay(n: u64) -> Vec<Element> {
    (0..n)
        .map(|i| {
            let kind = match i % 4 {
                0 => ElementKind::SceneHeading,
                1 => ElementKind::Action,
                2 => ElementKind::Character,
                _ => ElementKind::Dialogue,
            };
            Element::new(kind, format!("Line {i} {}", "word ".repeat((i % 20) as usize)), i)
        })
        .collect()
}

fn bench_sequential_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_pack");

    for size in [200u64, 2000] {
        let elements = screenplay(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &elements, |b, elements| {
            b.iter(|| pack_elements(black_box(elements), DEFAULT_PAGE_HEIGHT))
        });
    }

    group.finish();
}

fn bench_parallel_engine(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let elements = screenplay(2000);

    let mut group = c.benchmark_group("parallel_engine");
    group.throughput(Throughput::Elements(2000));

    for workers in [1usize, 4, 8] {
        let engine = PaginationEngine::with_config(EngineConfig {
            workers,
            chunk_timeout: Duration::from_secs(10),
        });
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &engine,
            |b, engine| {
                b.iter(|| {
                    rt.block_on(engine.paginate(black_box(&elements), DEFAULT_PAGE_HEIGHT))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sequential_pack, bench_parallel_engine);
criterion_main!(benches);

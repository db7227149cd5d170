//! Benchmarks for load coordination.

use bricks::prelude::*;
use bricks::testing::{QuerySpy, StubQuery};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn single_flight_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_flight");
    for waiters in [1_usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(waiters), &waiters, |b, &waiters| {
            b.iter(|| {
                let spy = QuerySpy::<u64>::new();
                let sut = spy.clone().single_flight();
                for _ in 0..waiters {
                    sut.load(Box::new(|value| {
                        black_box(value);
                    }));
                }
                spy.complete(0, 42);
            });
        });
    }
    group.finish();
}

fn paginator_benchmark(c: &mut Criterion) {
    c.bench_function("paginator_ten_pages", |b| {
        b.iter(|| {
            let sut = Paginator::new(|page: u64| StubQuery::new(Ok::<_, String>(vec![page; 8])));
            for _ in 0..10 {
                sut.load_more(Box::new(|page| {
                    black_box(page.map(|p| p.len()).unwrap_or_default());
                }));
            }
        });
    });
}

fn fan_out_benchmark(c: &mut Criterion) {
    c.bench_function("fan_out_32_items", |b| {
        let items: Vec<_> = (0..32_u32)
            .map(|i| StubQuery::new(Ok::<u32, std::fmt::Error>(i)).prioritized(Priority::new(i % 2)))
            .collect();
        let sut = StubQuery::new(Ok::<_, String>(items))
            .fan_out(FanOutConfig::new().with_mandatory_priority(Priority::new(1)));
        b.iter(|| {
            sut.load(Box::new(|result| {
                black_box(result.map(|slots| slots.len()).unwrap_or_default());
            }));
        });
    });
}

criterion_group!(benches, single_flight_benchmark, paginator_benchmark, fan_out_benchmark);
criterion_main!(benches);

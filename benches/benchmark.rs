use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use groupby_engine::{
    bench::{KEY_COLUMN, VALUE_COLUMN, synthetic_workload},
    processor::{
        AggregateOp,
        aggregate::{Rounding, percent_of_total},
        grouped::mean_above,
    },
};
use jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const ROWS: usize = 1_000_000;

fn grouped_operations(c: &mut Criterion) {
    let workload = synthetic_workload(ROWS, 100, 42).unwrap();
    let table = &workload.table;

    let mut group = c.benchmark_group("GroupedView");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    group.bench_function("group_by", |b| {
        b.iter(|| black_box(table.group_by(&[KEY_COLUMN]).unwrap().len()))
    });

    group.bench_function("aggregate_sum_mean", |b| {
        let view = table.group_by(&[KEY_COLUMN]).unwrap();
        b.iter(|| {
            black_box(
                view.aggregate(VALUE_COLUMN, &[AggregateOp::Sum, AggregateOp::Mean])
                    .unwrap(),
            )
        })
    });

    group.bench_function("transform_percent_of_total", |b| {
        let view = table.group_by(&[KEY_COLUMN]).unwrap();
        b.iter(|| {
            black_box(
                view.transform(VALUE_COLUMN, |v| percent_of_total(v, Rounding::HalfEven))
                    .unwrap(),
            )
        })
    });

    group.bench_function("filter_mean_above", |b| {
        let view = table.group_by(&[KEY_COLUMN]).unwrap();
        b.iter(|| black_box(view.filter(mean_above(VALUE_COLUMN, 0.5)).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, grouped_operations);
criterion_main!(benches);

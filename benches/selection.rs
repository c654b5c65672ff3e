//! Benchmarks for holdout evaluation and model selection.

use cashflow_forecast::core::TimeSeries;
use cashflow_forecast::models::{ModelVariant, OrderSelection};
use cashflow_forecast::pipeline::{Evaluate, HoldoutEvaluator, ModelSelector};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_weekly(n: usize) -> TimeSeries {
    let values = (0..n)
        .map(|i| {
            120.0
                + 0.4 * i as f64
                + 15.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
                + ((i * 17) % 13) as f64
        })
        .collect();
    TimeSeries::from_start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), values)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("holdout_evaluate");
    let evaluator = HoldoutEvaluator::default();

    for size in [60, 180, 365].iter() {
        let ts = generate_weekly(*size);
        for variant in ModelVariant::ALL {
            group.bench_with_input(BenchmarkId::new(variant.as_str(), size), size, |b, _| {
                b.iter(|| evaluator.evaluate(variant, black_box(&ts)))
            });
        }
    }

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    group.sample_size(20);

    let fixed = ModelSelector::default();
    let auto = ModelSelector::holdout(15, OrderSelection::Auto(Default::default()));

    for size in [90, 365].iter() {
        let ts = generate_weekly(*size);
        group.bench_with_input(BenchmarkId::new("fixed", size), size, |b, _| {
            b.iter(|| fixed.select(black_box(&ts)))
        });
        group.bench_with_input(BenchmarkId::new("auto", size), size, |b, _| {
            b.iter(|| auto.select(black_box(&ts)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_select);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mirna_dx::data::DesignMatrix;
use mirna_dx::evaluation::best_sensitivity_specificity;
use mirna_dx::training::{
    k_fold_validate, CVStrategy, CrossValidator, HyperparameterGrid, HyperparameterSelector, SVMConfig,
    SelectorConfig,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_cohort(n_rows: usize, n_features: usize) -> DesignMatrix {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

    let y = Array1::from_shape_fn(n_rows, |i| if i % 3 == 0 { 1.0 } else { 0.0 });
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, j)| {
        let shift = if j == 0 && y[i] > 0.5 { 1.5 } else { 0.0 };
        shift + rng.gen::<f64>() * 2.0
    });

    DesignMatrix {
        x,
        y,
        feature_names: (0..n_features).map(|i| format!("feature_{}", i)).collect(),
    }
}

fn bench_cross_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_validation");
    group.sample_size(10);

    for n_rows in [60, 150, 300].iter() {
        let data = create_cohort(*n_rows, 9);
        let cv = CrossValidator::new(CVStrategy::default());

        group.bench_with_input(BenchmarkId::new("k_fold_validate", n_rows), &data, |b, data| {
            b.iter(|| k_fold_validate(black_box(data), &SVMConfig::linear_balanced(1.0), &cv).unwrap())
        });
    }

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    group.sample_size(10);

    let data = create_cohort(90, 9);
    for parallel in [false, true] {
        let config = SelectorConfig::default()
            .with_grid(HyperparameterGrid::default())
            .with_parallel(parallel);
        let selector = HyperparameterSelector::new(config);

        group.bench_with_input(BenchmarkId::new("select_best", parallel), &data, |b, data| {
            b.iter(|| selector.select_best(black_box(data)).unwrap())
        });
    }

    group.finish();
}

fn bench_threshold_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold_search");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);

    for n in [100, 500, 1000].iter() {
        let actual = Array1::from_shape_fn(*n, |i| if i % 2 == 0 { 1.0 } else { 0.0 });
        let predictions = Array1::from_shape_fn(*n, |_| rng.gen::<f64>());

        group.bench_with_input(BenchmarkId::new("youden", n), n, |b, _| {
            b.iter(|| best_sensitivity_specificity(black_box(&actual), black_box(&predictions)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cross_validation, bench_sweep, bench_threshold_search);
criterion_main!(benches);

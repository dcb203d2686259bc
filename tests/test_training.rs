//! Integration test: cross-validation, regularization sweep and held-out scoring

use mirna_dx::data::{DesignMatrix, FeatureConfig};
use mirna_dx::error::DxError;
use mirna_dx::training::{
    evaluate_on_test, k_fold_validate, CVStrategy, ClassWeight, CrossValidator, DiagnosticModel,
    FinalModelPolicy, HyperparameterGrid, HyperparameterSelector, SVMClassifier, SVMConfig, SelectorConfig,
};
use polars::prelude::*;

/// TBM / PTB cohort with interleaved groups and a noisy miR-20a signal
fn cohort_df(n: usize, offset: usize) -> DataFrame {
    let groups = ["TBM", "PTB", "other meningitis"];
    let group: Vec<&str> = (0..n).map(|i| groups[i % 3]).collect();
    let noise = |i: usize, k: usize| (((i + offset) * k) % 11) as f64 / 10.0 - 0.5;
    let mir20a: Vec<f64> = (0..n)
        .map(|i| if i % 3 == 0 { 2.0 } else { 0.5 } + noise(i, 7))
        .collect();
    let mir486: Vec<f64> = (0..n).map(|i| 1.0 + noise(i, 5)).collect();
    let albumin: Vec<f64> = (0..n)
        .map(|i| if i % 3 == 0 { 32.0 } else { 38.0 } + 4.0 * noise(i, 3))
        .collect();

    df!(
        "group" => group,
        "miR-20a" => mir20a,
        "miR-486" => mir486,
        "albumin" => albumin
    )
    .unwrap()
}

fn design(n: usize, offset: usize) -> DesignMatrix {
    DesignMatrix::from_frame(&cohort_df(n, offset), "TBM", &FeatureConfig::default()).unwrap()
}

#[test]
fn test_k_fold_validate_pools_every_record() {
    let data = design(30, 0);
    let cv = CrossValidator::new(CVStrategy::default());
    let report = k_fold_validate(&data, &SVMConfig::linear_balanced(1.0), &cv).unwrap();

    assert_eq!(report.actual.len(), 30);
    assert_eq!(report.predicted.len(), 30);
    assert_eq!(report.accuracy.n_folds, 3);
    assert!((0.0..=1.0).contains(&report.auc));
    assert!(report.predicted.iter().all(|p| (0.0..=1.0).contains(p)));

    // Sequential folds pool the labels back in row order
    assert_eq!(report.actual, data.y);
}

#[test]
fn test_k_fold_validate_learns_signal() {
    let data = design(30, 0);
    let cv = CrossValidator::new(CVStrategy::default());
    let report = k_fold_validate(&data, &SVMConfig::linear_balanced(1.0), &cv).unwrap();
    assert!(report.auc > 0.8, "auc = {}", report.auc);
}

#[test]
fn test_k_fold_validate_single_class_training_partition() {
    // Positives only in the first third, so fold 0 trains on negatives only
    let mut data = design(30, 0);
    data.y = ndarray::Array1::from_shape_fn(30, |i| if i < 10 { 1.0 } else { 0.0 });
    let cv = CrossValidator::new(CVStrategy::default());
    let result = k_fold_validate(&data, &SVMConfig::linear_balanced(1.0), &cv);
    assert!(matches!(result, Err(DxError::DegenerateClasses(_))));
}

#[test]
fn test_sweep_over_full_grid() {
    let data = design(24, 0);
    let outcome = HyperparameterSelector::new(SelectorConfig::default())
        .select_best(&data)
        .unwrap();

    assert_eq!(outcome.trace.hps.len(), 30);
    assert_eq!(outcome.trace.aucs.len(), 30);
    assert_eq!(outcome.trace.accuracies.len(), 30);
    assert!(outcome.trace.hps.windows(2).all(|w| w[0] < w[1]));
    assert!(outcome.trace.hps.contains(&outcome.best_c));
    assert!(outcome.model.is_fitted());
    assert!(outcome.model.classifier.is_calibrated());
    assert_eq!(outcome.model.feature_names, data.feature_names);
}

#[test]
fn test_legacy_final_model_policy() {
    let data = design(24, 0);
    let config = SelectorConfig::default()
        .with_grid(HyperparameterGrid::new(1.5, 3, 6))
        .with_final_model(FinalModelPolicy {
            calibrated_probabilities: true,
            balanced_class_weight: false,
        });
    let outcome = HyperparameterSelector::new(config).select_best(&data).unwrap();
    assert!(outcome.model.classifier.is_calibrated());
    assert_eq!(outcome.model.classifier.config().class_weight, ClassWeight::Uniform);
    assert_eq!(outcome.trace.len(), 6);
}

#[test]
fn test_holdout_evaluation() {
    let train = design(30, 0);
    let test = design(15, 4);
    let config = SelectorConfig::default().with_grid(HyperparameterGrid::new(1.5, 4, 8));
    let outcome = HyperparameterSelector::new(config).select_best(&train).unwrap();

    let report = evaluate_on_test(&test, &outcome.model).unwrap();
    assert_eq!(report.actual.len(), 15);
    assert_eq!(report.predicted.len(), 15);
    assert!((0.0..=1.0).contains(&report.auc));
}

#[test]
fn test_holdout_rejects_unfitted_model() {
    let test = design(9, 0);
    let model = DiagnosticModel {
        classifier: SVMClassifier::new(SVMConfig::default()),
        feature_names: test.feature_names.clone(),
    };
    assert!(matches!(evaluate_on_test(&test, &model), Err(DxError::ModelNotFitted)));
}

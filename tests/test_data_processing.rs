//! Integration tests for data processing: preprocessing, feature subsets and data loading

use mirna_dx::data::{validate_labels, DataLoader, DesignMatrix, FeatureConfig, FeatureSubset, MissingValuePolicy};
use mirna_dx::error::DxError;
use mirna_dx::preprocessing::{column_names, PreprocessingConfig, TablePreprocessor};
use polars::prelude::*;
use std::io::Write;

fn mirnas() -> Vec<String> {
    ["miR-20a", "miR-20b", "miR-26a", "miR-106a", "miR-191", "miR-486"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn raw_table() -> DataFrame {
    df!(
        "Unnamed: 0" => &[0i64, 1, 2, 3],
        "group" => &["TBM", "PTB", "meningitis", "TBM"],
        "group property" => &["case", "control", "control", "case"],
        "miR-20a" => &[2.1, 0.4, 0.6, 1.9],
        "miR-20b" => &[1.0, 1.1, 0.9, 1.2],
        "miR-26a" => &[0.3, 0.2, 0.4, 0.5],
        "miR-106a" => &[1.4, 1.3, 1.2, 1.5],
        "miR-191" => &[0.8, 0.7, 0.9, 0.6],
        "miR-486" => &[2.2, 2.0, 2.1, 2.3],
        "Hct" => &[0.41, 0.38, 0.40, 0.36],
        "Alb" => &[31.0, 39.0, 37.0, 33.0],
        "N" => &[5.1, 3.2, 4.0, 6.3]
    )
    .unwrap()
}

// ============================================================================
// Preprocessing
// ============================================================================

#[test]
fn test_preprocess_cohort_table() {
    let raw = raw_table();
    let clean = TablePreprocessor::new().preprocess(&raw).unwrap();
    let names = column_names(&clean);

    assert!(!names.iter().any(|n| n.contains("Unnamed")));
    assert!(names.contains(&"hematocrit".to_string()));
    assert!(names.contains(&"albumin".to_string()));
    assert!(names.contains(&"neutrophil".to_string()));
    assert!(!names.contains(&"Hct".to_string()));

    let groups: Vec<Option<&str>> = clean.column("group").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(groups[2], Some("other meningitis"));

    // Input is untouched
    assert_eq!(raw.width(), 12);
    assert!(column_names(&raw).contains(&"Hct".to_string()));
}

#[test]
fn test_preprocess_idempotent() {
    let preprocessor = TablePreprocessor::new();
    let once = preprocessor.preprocess(&raw_table()).unwrap();
    let twice = preprocessor.preprocess(&once).unwrap();
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_custom_rename_rules() {
    let config = PreprocessingConfig::empty().with_column_rename("N", "neutrophil_count");
    let clean = TablePreprocessor::with_config(config).preprocess(&raw_table()).unwrap();
    let names = column_names(&clean);
    assert!(names.contains(&"neutrophil_count".to_string()));
    assert!(names.contains(&"Unnamed: 0".to_string()));
    assert!(names.contains(&"Hct".to_string()));
}

// ============================================================================
// Feature subsets
// ============================================================================

#[test]
fn test_subset_columns() {
    let clean = TablePreprocessor::new().preprocess(&raw_table()).unwrap();
    let features = FeatureConfig::default();

    let combined = FeatureSubset::Combined.columns(&clean, &mirnas(), &features).unwrap();
    assert_eq!(combined.len(), clean.width());

    let ehr = FeatureSubset::EhrOnly.columns(&clean, &mirnas(), &features).unwrap();
    assert!(ehr.iter().all(|c| !c.starts_with("miR-")));
    assert!(ehr.contains(&"group".to_string()));
    assert!(ehr.contains(&"albumin".to_string()));

    let mirna = FeatureSubset::MirnaOnly.columns(&clean, &mirnas(), &features).unwrap();
    assert_eq!(&mirna[..6], mirnas().as_slice());
    assert_eq!(&mirna[6..], &["group".to_string(), "group property".to_string()]);
}

#[test]
fn test_missing_mirna_column() {
    let clean = TablePreprocessor::new().preprocess(&raw_table()).unwrap();
    let mut wanted = mirnas();
    wanted.push("miR-155".to_string());
    let result = FeatureSubset::MirnaOnly.select(&clean, &wanted, &FeatureConfig::default());
    assert!(matches!(result, Err(DxError::FeatureNotFound(name)) if name == "miR-155"));
}

#[test]
fn test_design_matrix_excludes_labels() {
    let clean = TablePreprocessor::new().preprocess(&raw_table()).unwrap();
    let data = DesignMatrix::from_frame(&clean, "TBM", &FeatureConfig::default()).unwrap();

    assert_eq!(data.n_samples(), 4);
    assert_eq!(data.n_features(), 9);
    assert!(!data.feature_names.iter().any(|n| n.starts_with("group")));
    assert_eq!(data.y.to_vec(), vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(data.n_positive(), 2);
}

#[test]
fn test_missing_values_policies() {
    let df = df!(
        "group" => &["TBM", "PTB", "TBM"],
        "miR-20a" => &[Some(1.0), None, Some(3.0)]
    )
    .unwrap();

    let result = DesignMatrix::from_frame(&df, "TBM", &FeatureConfig::default());
    assert!(matches!(result, Err(DxError::NonFiniteFeature { row: 1, .. })));

    let filled = DesignMatrix::from_frame(
        &df,
        "TBM",
        &FeatureConfig::default().with_missing_values(MissingValuePolicy::FillMean),
    )
    .unwrap();
    assert_eq!(filled.x[[1, 0]], 2.0);
}

#[test]
fn test_label_validation() {
    let clean = TablePreprocessor::new().preprocess(&raw_table()).unwrap();
    let features = FeatureConfig::default();

    let data = DesignMatrix::from_frame(&clean, "HIV", &features).unwrap();
    assert!(matches!(
        validate_labels(&data.y, "HIV"),
        Err(DxError::UnknownPositiveLabel { label }) if label == "HIV"
    ));

    let all_positive = ndarray::Array1::from_elem(4, 1.0);
    assert!(matches!(validate_labels(&all_positive, "TBM"), Err(DxError::DegenerateClasses(_))));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_split_from_folder() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["train_df.csv", "test_df.csv"] {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "Unnamed: 0,group,group property,miR-20a,Hct").unwrap();
        writeln!(file, "0,TBM,case,2.0,0.41").unwrap();
        writeln!(file, "1,PTB,control,0.5,0.39").unwrap();
    }

    let (train, test) = DataLoader::new()
        .load_split(dir.path(), "train_df.csv", "test_df.csv")
        .unwrap();
    assert_eq!(train.height(), 2);
    assert_eq!(test.width(), 5);

    // The exported index column is dropped
    let clean = TablePreprocessor::new().preprocess(&train).unwrap();
    assert_eq!(clean.width(), 4);
}

#[test]
fn test_load_missing_folder() {
    let result = DataLoader::new().load_split(std::path::Path::new("/nonexistent"), "train_df.csv", "test_df.csv");
    assert!(matches!(result, Err(DxError::IoError(_))));
}

//! Three-subset diagnostic study

use crate::data::{binary_labels, validate_labels, DataLoader, DesignMatrix, FeatureSubset};
use crate::error::Result;
use crate::evaluation::best_sensitivity_specificity;
use crate::pipeline::config::StudyConfig;
use crate::pipeline::report::{StudyReport, SubsetReport};
use crate::preprocessing::TablePreprocessor;
use crate::training::{evaluate_on_test, HyperparameterSelector};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Runs preprocessing, selection and held-out evaluation for each feature subset
#[derive(Debug, Clone)]
pub struct DiagnosticStudy {
    config: StudyConfig,
}

impl DiagnosticStudy {
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Load `train_file` and `test_file` from `folder` and run
    pub fn run_from_folder(&self, folder: &Path) -> Result<StudyReport> {
        let (train, test) =
            DataLoader::new().load_split(folder, &self.config.train_file, &self.config.test_file)?;
        self.run(&train, &test)
    }

    /// Run all subsets on raw training and testing tables
    pub fn run(&self, train: &DataFrame, test: &DataFrame) -> Result<StudyReport> {
        self.config.validate()?;
        let start = Instant::now();

        let preprocessor = TablePreprocessor::with_config(self.config.preprocessing.clone());
        let train = preprocessor.preprocess(train)?;
        let test = preprocessor.preprocess(test)?;

        let label = &self.config.positive_label;
        let y = binary_labels(&train, &self.config.features.label_column, label)?;
        validate_labels(&y, label)?;

        let subsets = if self.config.parallel_subsets {
            FeatureSubset::ALL
                .par_iter()
                .map(|&subset| self.run_subset(subset, &train, &test))
                .collect::<Result<Vec<_>>>()?
        } else {
            FeatureSubset::ALL
                .iter()
                .map(|&subset| self.run_subset(subset, &train, &test))
                .collect::<Result<Vec<_>>>()?
        };

        info!(
            positive_label = %label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Study complete"
        );

        Ok(StudyReport {
            positive_label: label.clone(),
            subsets,
        })
    }

    fn run_subset(&self, subset: FeatureSubset, train: &DataFrame, test: &DataFrame) -> Result<SubsetReport> {
        let features = &self.config.features;
        let label = &self.config.positive_label;

        let feature_names: Vec<String> = subset
            .columns(train, &self.config.mirnas, features)?
            .into_iter()
            .filter(|c| !features.non_feature_columns().contains(&c.as_str()))
            .collect();

        let train_matrix = DesignMatrix::from_frame_with_columns(train, &feature_names, label, features)?;
        let test_matrix = DesignMatrix::from_frame_with_columns(test, &feature_names, label, features)?;

        info!(
            subset = %subset,
            n_features = feature_names.len(),
            n_train = train_matrix.n_samples(),
            n_test = test_matrix.n_samples(),
            "Modelling subset"
        );

        let outcome = HyperparameterSelector::new(self.config.selector.clone()).select_best(&train_matrix)?;
        let test_report = evaluate_on_test(&test_matrix, &outcome.model)?;

        let (valid_actual, valid_predicted) = &outcome.best_validation;
        let validation = best_sensitivity_specificity(valid_actual, valid_predicted)?;
        let test_point = best_sensitivity_specificity(&test_report.actual, &test_report.predicted)?;

        Ok(SubsetReport {
            subset,
            n_features: feature_names.len(),
            best_c: outcome.best_c,
            validation_auc: outcome.best_auc,
            test_auc: test_report.auc,
            validation,
            test: test_point,
            trace: outcome.trace,
        })
    }
}

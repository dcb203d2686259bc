//! mirna-dx - Diagnostic modelling from exosomal microRNA and EHR data
//!
//! This crate compares support-vector diagnosis of tuberculous meningitis or
//! pulmonary tuberculosis on three feature subsets: EHR and miRNA together,
//! EHR only and miRNA only.
//!
//! # Modules
//!
//! - [`data`] - CSV loading, feature subsets and design matrices
//! - [`preprocessing`] - Column renames, artifact removal, value rewrites, scaling
//! - [`training`] - SVM, k-fold validation, regularization sweep, held-out evaluation
//! - [`calibration`] - Platt scaling of decision values
//! - [`evaluation`] - ROC-AUC, confusion matrices and Youden operating points
//! - [`pipeline`] - End-to-end study and report
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data and modelling
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod calibration;
pub mod evaluation;

// Orchestration
pub mod pipeline;
pub mod cli;

pub use error::{DxError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::data::{DataLoader, DesignMatrix, FeatureConfig, FeatureSubset, MissingValuePolicy};
    pub use crate::error::{DxError, Result};
    pub use crate::evaluation::{
        best_sensitivity_specificity, best_threshold, roc_auc, roc_curve, sensitivity_specificity_at, OperatingPoint,
    };
    pub use crate::pipeline::{DiagnosticStudy, StudyConfig, StudyReport, SubsetReport};
    pub use crate::preprocessing::{PreprocessingConfig, TablePreprocessor};
    pub use crate::training::{
        evaluate_on_test, k_fold_validate, CVStrategy, CrossValidator, HyperparameterGrid, HyperparameterSelector,
        SVMClassifier, SVMConfig, SelectorConfig,
    };
}

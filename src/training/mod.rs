//! Model training module
//!
//! Provides the diagnostic modelling chain:
//! - Support Vector Machines with balanced class weights and Platt probabilities
//! - K-fold splitting with pooled out-of-fold ROC-AUC
//! - Regularization sweep and final refit
//! - Held-out evaluation

pub mod cross_validation;
pub mod holdout;
pub mod selection;
pub mod svm;

pub use cross_validation::{k_fold_validate, CVResults, CVSplit, CVStrategy, CrossValidator, FoldReport};
pub use holdout::{evaluate_on_test, TestReport};
pub use selection::{
    DiagnosticModel, FinalModelPolicy, HyperparameterGrid, HyperparameterSelector, SelectionOutcome,
    SelectorConfig, SweepTrace,
};
pub use svm::{ClassWeight, KernelType, SVMClassifier, SVMConfig};

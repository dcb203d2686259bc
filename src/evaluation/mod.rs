//! Diagnostic evaluation metrics
//!
//! Provides:
//! - ROC curve and trapezoidal ROC-AUC
//! - Confusion matrix, sensitivity and specificity at a cutoff
//! - Youden-index threshold search

mod confusion;
mod roc;
mod youden;

pub use confusion::{accuracy, sensitivity_specificity_at, ConfusionMatrix};
pub use roc::{roc_auc, roc_curve, RocCurve, RocPoint};
pub use youden::{best_sensitivity_specificity, best_threshold, OperatingPoint};

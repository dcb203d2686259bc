//! Youden-index threshold search
//!
//! Every distinct predicted value is tried as a cutoff and the one with the
//! greatest sensitivity + specificity wins. Each candidate costs a full pass
//! over the predictions, so the search is O(n²). That is fine for cohorts of
//! tens to a few hundred patients and is not meant for larger sets.

use super::confusion::{sensitivity_specificity_at, ConfusionMatrix};
use crate::error::{DxError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Sensitivity/specificity at a chosen threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub threshold: f64,
    pub sensitivity: f64,
    pub specificity: f64,
}

impl OperatingPoint {
    /// sensitivity + specificity - 1
    pub fn youden_index(&self) -> f64 {
        self.sensitivity + self.specificity - 1.0
    }
}

/// Distinct prediction values in ascending order
fn candidate_cutoffs(predictions: &Array1<f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = predictions.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    sorted
}

/// Cutoff maximizing sensitivity + specificity.
///
/// Ties keep the smallest cutoff.
pub fn best_threshold(actual: &Array1<f64>, predictions: &Array1<f64>) -> Result<f64> {
    if predictions.is_empty() {
        return Err(DxError::EmptyInput("threshold search needs predictions".to_string()));
    }

    let mut best: Option<(f64, f64)> = None;
    for cutoff in candidate_cutoffs(predictions) {
        let cm = ConfusionMatrix::at_cutoff(actual, predictions, cutoff)?;
        let total = cm.sensitivity()? + cm.specificity()?;
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((cutoff, total)),
        }
    }

    best.map(|(cutoff, _)| cutoff)
        .ok_or_else(|| DxError::EmptyInput("no candidate cutoffs".to_string()))
}

/// Sensitivity and specificity at the Youden-optimal cutoff
pub fn best_sensitivity_specificity(
    actual: &Array1<f64>,
    predictions: &Array1<f64>,
) -> Result<OperatingPoint> {
    let threshold = best_threshold(actual, predictions)?;
    let (sensitivity, specificity) = sensitivity_specificity_at(actual, predictions, threshold)?;
    Ok(OperatingPoint { threshold, sensitivity, specificity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_predictions() {
        let actual = array![0.0, 0.0, 1.0, 1.0];
        let predictions = array![0.1, 0.2, 0.8, 0.9];
        let point = best_sensitivity_specificity(&actual, &predictions).unwrap();
        // Cutoffs are strict, so 0.2 is the first value that splits perfectly
        assert_eq!(point.threshold, 0.2);
        assert_eq!(point.sensitivity, 1.0);
        assert_eq!(point.specificity, 1.0);
        assert_eq!(point.youden_index(), 1.0);
    }

    #[test]
    fn test_ties_keep_first_cutoff() {
        // Cutoffs 0.3 and 0.5 both give sum 1.5; 0.3 comes first
        let actual = array![1.0, 0.0, 1.0, 0.0];
        let predictions = array![0.7, 0.5, 0.4, 0.3];
        // 0.3: TP=2 FP=1 TN=1 -> 1.0 + 0.5
        // 0.4: TP=1 FN=1 FP=1 TN=1 -> 0.5 + 0.5
        // 0.5: TP=1 FN=1 TN=2 -> 0.5 + 1.0
        assert_eq!(best_threshold(&actual, &predictions).unwrap(), 0.3);
    }

    #[test]
    fn test_empty_predictions() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(best_threshold(&empty, &empty), Err(DxError::EmptyInput(_))));
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let actual = array![1.0, 1.0, 1.0];
        let predictions = array![0.2, 0.5, 0.9];
        let result = best_sensitivity_specificity(&actual, &predictions);
        assert!(matches!(result, Err(DxError::DegenerateClasses(_))));
    }
}

//! Binary confusion matrix and rate metrics

use crate::error::{DxError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix for a positive/negative split.
///
/// Both axes are ordered (positive, negative): rows are actual classes,
/// columns are predicted classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    /// Binarize `predictions` with `value > cutoff` and count outcomes
    pub fn at_cutoff(actual: &Array1<f64>, predictions: &Array1<f64>, cutoff: f64) -> Result<Self> {
        check_lengths(actual, predictions)?;

        let mut cm = Self::default();
        for (&y, &p) in actual.iter().zip(predictions.iter()) {
            match (y > 0.5, p > cutoff) {
                (true, true) => cm.true_positives += 1,
                (true, false) => cm.false_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (false, false) => cm.true_negatives += 1,
            }
        }
        Ok(cm)
    }

    /// Rows actual, columns predicted, (positive, negative) order
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [
            [self.true_positives, self.false_negatives],
            [self.false_positives, self.true_negatives],
        ]
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_negatives + self.false_positives + self.true_negatives
    }

    /// True positive rate: TP / (TP + FN)
    pub fn sensitivity(&self) -> Result<f64> {
        let actual_pos = self.true_positives + self.false_negatives;
        if actual_pos == 0 {
            return Err(DxError::DegenerateClasses(
                "sensitivity is undefined without positive samples".to_string(),
            ));
        }
        Ok(self.true_positives as f64 / actual_pos as f64)
    }

    /// True negative rate: TN / (TN + FP)
    pub fn specificity(&self) -> Result<f64> {
        let actual_neg = self.true_negatives + self.false_positives;
        if actual_neg == 0 {
            return Err(DxError::DegenerateClasses(
                "specificity is undefined without negative samples".to_string(),
            ));
        }
        Ok(self.true_negatives as f64 / actual_neg as f64)
    }
}

/// Sensitivity and specificity with predictions above `cutoff` called positive
pub fn sensitivity_specificity_at(
    actual: &Array1<f64>,
    predictions: &Array1<f64>,
    cutoff: f64,
) -> Result<(f64, f64)> {
    let cm = ConfusionMatrix::at_cutoff(actual, predictions, cutoff)?;
    Ok((cm.sensitivity()?, cm.specificity()?))
}

/// Fraction of matching hard labels
pub fn accuracy(actual: &Array1<f64>, predicted: &Array1<f64>) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if actual.is_empty() {
        return Err(DxError::EmptyInput("accuracy needs at least one sample".to_string()));
    }
    let correct = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(&t, &p)| (t - p).abs() < 0.5)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

fn check_lengths(actual: &Array1<f64>, predictions: &Array1<f64>) -> Result<()> {
    if actual.len() != predictions.len() {
        return Err(DxError::ShapeError {
            expected: format!("{} labels", predictions.len()),
            actual: format!("{} labels", actual.len()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fixture() -> (Array1<f64>, Array1<f64>) {
        let actual = array![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let predictions = array![0.9, 0.7, 0.4, 0.1, 0.85, 0.6, 0.3, 0.15, 0.05];
        (actual, predictions)
    }

    #[test]
    fn test_hand_computed_cutoffs() {
        let (actual, predictions) = fixture();

        // > 0.2: TP=3 FN=1, FP=3 TN=2
        let (sens, spec) = sensitivity_specificity_at(&actual, &predictions, 0.2).unwrap();
        assert_eq!(sens, 3.0 / 4.0);
        assert_eq!(spec, 2.0 / 5.0);

        // > 0.5: TP=2 FN=2, FP=2 TN=3
        let (sens, spec) = sensitivity_specificity_at(&actual, &predictions, 0.5).unwrap();
        assert_eq!(sens, 2.0 / 4.0);
        assert_eq!(spec, 3.0 / 5.0);

        // > 0.8: TP=1 FN=3, FP=1 TN=4
        let (sens, spec) = sensitivity_specificity_at(&actual, &predictions, 0.8).unwrap();
        assert_eq!(sens, 1.0 / 4.0);
        assert_eq!(spec, 4.0 / 5.0);
    }

    #[test]
    fn test_cutoff_is_strict() {
        let actual = array![1.0, 0.0];
        let predictions = array![0.5, 0.2];
        let cm = ConfusionMatrix::at_cutoff(&actual, &predictions, 0.5).unwrap();
        assert_eq!(cm.true_positives, 0);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.as_matrix(), [[0, 1], [0, 1]]);
        assert_eq!(cm.total(), 2);
    }

    #[test]
    fn test_missing_class_is_error() {
        let actual = array![0.0, 0.0, 0.0];
        let predictions = array![0.1, 0.5, 0.9];
        let result = sensitivity_specificity_at(&actual, &predictions, 0.3);
        assert!(matches!(result, Err(DxError::DegenerateClasses(_))));
    }

    #[test]
    fn test_accuracy() {
        let actual = array![1.0, 0.0, 1.0, 0.0];
        let predicted = array![1.0, 0.0, 0.0, 0.0];
        assert_eq!(accuracy(&actual, &predicted).unwrap(), 0.75);
    }
}

//! ROC curve and trapezoidal AUC

use crate::error::{DxError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single point on the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// Scores at or above this value are called positive
    pub threshold: f64,
    /// False positive rate: FP / (FP + TN)
    pub fpr: f64,
    /// True positive rate: TP / (TP + FN)
    pub tpr: f64,
}

/// ROC curve with its area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// Points from (0, 0) to (1, 1), thresholds descending
    pub points: Vec<RocPoint>,
    /// Area under the curve (trapezoidal rule over FPR)
    pub auc: f64,
}

/// Compute the ROC curve of `scores` against binary `actual` labels.
///
/// Labels greater than 0.5 count as positive. Samples are walked in
/// descending score order and tied scores enter the curve together, so a
/// block of ties contributes one diagonal segment.
///
/// # Errors
///
/// Empty input, mismatched lengths, non-finite scores, or a label set
/// missing either class.
pub fn roc_curve(actual: &Array1<f64>, scores: &Array1<f64>) -> Result<RocCurve> {
    if scores.is_empty() {
        return Err(DxError::EmptyInput("ROC curve needs at least one score".to_string()));
    }
    if actual.len() != scores.len() {
        return Err(DxError::ShapeError {
            expected: format!("{} labels", scores.len()),
            actual: format!("{} labels", actual.len()),
        });
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(DxError::InvalidInput(format!("score at index {} is not finite", i)));
    }

    let total_pos = actual.iter().filter(|&&y| y > 0.5).count();
    let total_neg = actual.len() - total_pos;
    if total_pos == 0 {
        return Err(DxError::DegenerateClasses("ROC curve needs positive samples".to_string()));
    }
    if total_neg == 0 {
        return Err(DxError::DegenerateClasses("ROC curve needs negative samples".to_string()));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let p = total_pos as f64;
    let n = total_neg as f64;

    let mut points = Vec::with_capacity(order.len() + 1);
    points.push(RocPoint { threshold: f64::INFINITY, fpr: 0.0, tpr: 0.0 });

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < order.len() {
        let current = scores[order[i]];
        while i < order.len() && scores[order[i]] == current {
            if actual[order[i]] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: current,
            fpr: fp as f64 / n,
            tpr: tp as f64 / p,
        });
    }

    let auc = trapezoidal_auc(&points);
    Ok(RocCurve { points, auc })
}

/// Area under the ROC curve; shorthand for `roc_curve(..)?.auc`
pub fn roc_auc(actual: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    Ok(roc_curve(actual, scores)?.auc)
}

fn trapezoidal_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

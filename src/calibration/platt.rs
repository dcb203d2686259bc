//! Platt scaling (sigmoid calibration of SVM decision values)

use crate::calibration::Calibrator;
use crate::error::{DxError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Platt scaling calibrator
///
/// Fits P(y=1|f) = 1 / (1 + exp(-(A*f + B))) where f is a raw decision value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlattScaling {
    /// Slope parameter A
    a: Option<f64>,
    /// Intercept parameter B
    b: Option<f64>,
    /// Maximum Newton iterations
    max_iter: usize,
    /// Convergence tolerance on the gradient
    tol: f64,
}

impl PlattScaling {
    /// Create new Platt scaling calibrator
    pub fn new() -> Self {
        Self {
            a: None,
            b: None,
            max_iter: 100,
            tol: 1e-5,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Get fitted parameters
    pub fn parameters(&self) -> Option<(f64, f64)> {
        match (self.a, self.b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    fn sigmoid(x: f64) -> f64 {
        if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let e = x.exp();
            e / (1.0 + e)
        }
    }

    /// log(1 + exp(z)) without overflow
    fn softplus(z: f64) -> f64 {
        z.max(0.0) + (-z.abs()).exp().ln_1p()
    }

    fn objective(scores: &Array1<f64>, targets: &[f64], a: f64, b: f64) -> f64 {
        scores
            .iter()
            .zip(targets.iter())
            .map(|(&f, &t)| {
                let z = a * f + b;
                Self::softplus(z) - t * z
            })
            .sum()
    }
}

impl Default for PlattScaling {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator for PlattScaling {
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let n = scores.len();
        if n != labels.len() {
            return Err(DxError::ValidationError(
                "Scores and labels must have same length".to_string(),
            ));
        }
        if n == 0 {
            return Err(DxError::EmptyInput("Platt scaling needs samples".to_string()));
        }

        // Platt's smoothed targets guard against overfitting small sets
        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = n as f64 - n_pos;
        let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
        let target_neg = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { target_pos } else { target_neg })
            .collect();

        let mut a = 0.0;
        let mut b = ((n_pos + 1.0) / (n_neg + 1.0)).ln();
        let mut current = Self::objective(scores, &targets, a, b);

        for _ in 0..self.max_iter {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            let mut hess_aa = 1e-12;
            let mut hess_ab = 0.0;
            let mut hess_bb = 1e-12;

            for (&f, &t) in scores.iter().zip(targets.iter()) {
                let p = Self::sigmoid(a * f + b);
                let d1 = p - t;
                let d2 = p * (1.0 - p);

                grad_a += f * d1;
                grad_b += d1;
                hess_aa += f * f * d2;
                hess_ab += f * d2;
                hess_bb += d2;
            }

            if grad_a.abs() < self.tol && grad_b.abs() < self.tol {
                break;
            }

            // Solve the 2x2 Newton system with Cramer's rule
            let det = hess_aa * hess_bb - hess_ab * hess_ab;
            if det.abs() < 1e-18 {
                break;
            }
            let delta_a = (hess_bb * grad_a - hess_ab * grad_b) / det;
            let delta_b = (hess_aa * grad_b - hess_ab * grad_a) / det;

            // Backtracking line search on the cross-entropy
            let mut step = 1.0;
            let mut improved = false;
            while step >= 1e-10 {
                let new_a = a - step * delta_a;
                let new_b = b - step * delta_b;
                let candidate = Self::objective(scores, &targets, new_a, new_b);
                if candidate <= current - 1e-4 * step * (grad_a * delta_a + grad_b * delta_b) {
                    a = new_a;
                    b = new_b;
                    current = candidate;
                    improved = true;
                    break;
                }
                step /= 2.0;
            }

            if !improved {
                break;
            }
        }

        self.a = Some(a);
        self.b = Some(b);
        Ok(())
    }

    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = self.parameters().ok_or(DxError::ModelNotFitted)?;
        Ok(scores.mapv(|f| Self::sigmoid(a * f + b)))
    }
}

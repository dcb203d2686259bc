//! Z-score feature scaling on design matrices

use crate::error::{DxError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaler: (x - mean) / std, fitted per column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(DxError::EmptyInput("cannot fit a scaler on zero rows".to_string()));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| DxError::EmptyInput("cannot fit a scaler on zero rows".to_string()))?;
        // Constant columns keep unit scale so they map to zero
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    /// Apply the fitted transform
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(DxError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

//! Probability calibration
//!
//! Maps raw classifier decision values to probabilities.

mod platt;

pub use platt::PlattScaling;

use crate::error::Result;
use ndarray::Array1;

/// Trait for score-to-probability calibrators
pub trait Calibrator: Send + Sync {
    /// Fit the calibrator on decision values and true labels
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()>;

    /// Map decision values to positive-class probabilities
    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>>;

    /// Fit and calibrate in one step
    fn fit_calibrate(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        self.fit(scores, labels)?;
        self.calibrate(scores)
    }
}

//! Held-out evaluation of a selected model

use crate::data::DesignMatrix;
use crate::error::{DxError, Result};
use crate::evaluation::roc_auc;
use crate::training::selection::DiagnosticModel;
use ndarray::{Array1, Array2, Axis};
use tracing::info;

/// Labels and probabilities of the test table with their ROC-AUC
#[derive(Debug, Clone)]
pub struct TestReport {
    pub auc: f64,
    pub actual: Array1<f64>,
    pub predicted: Array1<f64>,
}

/// Score a fitted model on the test matrix.
///
/// Test columns are matched to the model's training columns by name, so the
/// test table may order or extend its columns differently.
pub fn evaluate_on_test(test: &DesignMatrix, model: &DiagnosticModel) -> Result<TestReport> {
    if !model.is_fitted() {
        return Err(DxError::ModelNotFitted);
    }

    let x = align_columns(test, &model.feature_names)?;
    let predicted = model.classifier.predict_proba(&x)?;
    let actual = test.y.clone();
    let auc = roc_auc(&actual, &predicted)?;

    info!(n_samples = test.n_samples(), auc, "Evaluated held-out set");

    Ok(TestReport { auc, actual, predicted })
}

fn align_columns(test: &DesignMatrix, feature_names: &[String]) -> Result<Array2<f64>> {
    if test.feature_names == feature_names {
        return Ok(test.x.clone());
    }
    let indices = feature_names
        .iter()
        .map(|name| {
            test.feature_names
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| DxError::FeatureNotFound(name.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(test.x.select(Axis(1), &indices))
}

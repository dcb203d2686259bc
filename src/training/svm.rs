//! Support Vector Machine classifier
//!
//! Binary C-SVC trained with SMO (Sequential Minimal Optimization), with
//! per-class box constraints for balanced class weighting and optional
//! Platt-calibrated probabilities.
//!
//! The working pair is chosen by second-order selection: `i` is the maximal
//! KKT violator and `j` maximizes the guaranteed objective decrease. Training
//! stops once the maximal violation drops below `tol`.

use crate::calibration::{Calibrator, PlattScaling};
use crate::error::{DxError, Result};
use crate::evaluation::accuracy;
use crate::preprocessing::StandardScaler;
use crate::training::cross_validation::{CVStrategy, CrossValidator};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Floor of the automatic SMO iteration cap
const MIN_AUTO_ITERATIONS: usize = 1_000_000;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Polynomial kernel: K(x, y) = (γ * x · y + r)^d
    Polynomial { degree: usize, gamma: f64, coef0: f64 },
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF { gamma: f64 },
    /// Sigmoid kernel: K(x, y) = tanh(γ * x · y + r)
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Linear
    }
}

impl KernelType {
    fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            KernelType::Linear => a.dot(&b),
            KernelType::Polynomial { degree, gamma, coef0 } => {
                (*gamma * a.dot(&b) + coef0).powi((*degree).min(i32::MAX as usize) as i32)
            }
            KernelType::RBF { gamma } => {
                let norm_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * norm_sq).exp()
            }
            KernelType::Sigmoid { gamma, coef0 } => (*gamma * a.dot(&b) + coef0).tanh(),
        }
    }
}

/// Per-class weighting of the regularization strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample gets C
    #[default]
    Uniform,
    /// Sample of class k gets C * n / (2 * n_k)
    Balanced,
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Stopping tolerance on the maximal KKT violation
    pub tol: f64,
    /// Cap on SMO pair updates; `None` scales with the sample count
    pub max_iter: Option<usize>,
    /// Seed for the calibration folds
    pub random_state: Option<u64>,
    /// Class weighting of C
    pub class_weight: ClassWeight,
    /// Fit a Platt sigmoid for `predict_proba`
    pub probability: bool,
    /// Z-score features with statistics of the training data
    pub standardize: bool,
    /// Internal folds used to collect out-of-fold decision values for Platt scaling
    pub calibration_folds: usize,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Linear,
            tol: 1e-3,
            max_iter: None,
            random_state: Some(42),
            class_weight: ClassWeight::Uniform,
            probability: false,
            standardize: true,
            calibration_folds: 5,
        }
    }
}

impl SVMConfig {
    /// Linear, probability-calibrated, class-balanced classifier with strength `c`
    pub fn linear_balanced(c: f64) -> Self {
        Self {
            c,
            class_weight: ClassWeight::Balanced,
            probability: true,
            ..Default::default()
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelType) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_probability(mut self, probability: bool) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    pub fn with_max_iter(mut self, max_iter: Option<usize>) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(DxError::InvalidInput(format!("C must be positive and finite, got {}", self.c)));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(DxError::InvalidInput(format!("tol must be positive, got {}", self.tol)));
        }
        if self.max_iter == Some(0) {
            return Err(DxError::InvalidInput("max_iter must be at least 1".to_string()));
        }
        if self.calibration_folds < 2 {
            return Err(DxError::InvalidInput("calibration_folds must be at least 2".to_string()));
        }
        Ok(())
    }
}

/// Support Vector Classifier for 0/1 labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    scaler: Option<StandardScaler>,
    support_vectors: Option<Array2<f64>>,
    /// alpha_i * y_i for each support vector
    dual_coef: Option<Array1<f64>>,
    /// Primal weights, only for the linear kernel
    weights: Option<Array1<f64>>,
    bias: f64,
    calibrator: Option<PlattScaling>,
    n_features: usize,
    is_fitted: bool,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            scaler: None,
            support_vectors: None,
            dual_coef: None,
            weights: None,
            bias: 0.0,
            calibrator: None,
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit on features `x` and labels `y` in {0, 1}
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        validate_training_data(x, y)?;

        let scaler = if self.config.standardize {
            Some(StandardScaler::fit(x)?)
        } else {
            None
        };
        let x_fit = match &scaler {
            Some(s) => s.transform(x)?,
            None => x.clone(),
        };

        let y_signed = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });
        let bounds = self.box_constraints(y);
        let solution = self.smo_train(&x_fit, &y_signed, &bounds)?;
        let (alphas, bias) = (solution.alphas, solution.bias);

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-10)
            .map(|(i, _)| i)
            .collect();

        let support_vectors = x_fit.select(Axis(0), &support_indices);
        let dual_coef: Array1<f64> = support_indices
            .iter()
            .map(|&i| alphas[i] * y_signed[i])
            .collect();

        self.weights = match self.config.kernel {
            KernelType::Linear => Some(support_vectors.t().dot(&dual_coef)),
            _ => None,
        };
        self.support_vectors = Some(support_vectors);
        self.dual_coef = Some(dual_coef);
        self.bias = bias;
        self.scaler = scaler;
        self.n_features = x.ncols();
        self.calibrator = None;
        self.is_fitted = true;

        debug!(
            c = self.config.c,
            n_samples = x.nrows(),
            n_support = support_indices.len(),
            iterations = solution.iterations,
            "Fitted SVM"
        );

        if self.config.probability {
            self.calibrator = Some(self.fit_calibrator(x, y)?);
        }

        Ok(())
    }

    /// C scaled per sample by the class weight
    fn box_constraints(&self, y: &Array1<f64>) -> Array1<f64> {
        let c = self.config.c;
        match self.config.class_weight {
            ClassWeight::Uniform => Array1::from_elem(y.len(), c),
            ClassWeight::Balanced => {
                let n = y.len() as f64;
                let n_pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
                let n_neg = n - n_pos;
                let w_pos = n / (2.0 * n_pos);
                let w_neg = n / (2.0 * n_neg);
                y.mapv(|v| if v > 0.5 { c * w_pos } else { c * w_neg })
            }
        }
    }

    /// Platt sigmoid on out-of-fold decision values, or in-sample values when
    /// the data cannot support the internal split
    fn fit_calibrator(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<PlattScaling> {
        let scores = match self.out_of_fold_decisions(x, y)? {
            Some(scores) => scores,
            None => {
                debug!(n_samples = x.nrows(), "Calibrating on in-sample decision values");
                self.decision_function(x)?
            }
        };
        let mut platt = PlattScaling::new();
        platt.fit(&scores, y)?;
        Ok(platt)
    }

    fn out_of_fold_decisions(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Option<Array1<f64>>> {
        let folds = self.config.calibration_folds;
        if x.nrows() < 2 * folds {
            return Ok(None);
        }

        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: folds, shuffle: true });
        let cv = match self.config.random_state {
            Some(seed) => cv.with_random_state(seed),
            None => cv,
        };

        let inner_config = SVMConfig {
            probability: false,
            ..self.config.clone()
        };

        let mut scores = Array1::zeros(x.nrows());
        for split in cv.split(x.nrows(), None)? {
            let y_train = y.select(Axis(0), &split.train_indices);
            if !has_both_classes(&y_train) {
                return Ok(None);
            }
            let x_train = x.select(Axis(0), &split.train_indices);
            let mut inner = SVMClassifier::new(inner_config.clone());
            inner.fit(&x_train, &y_train)?;

            let x_valid = x.select(Axis(0), &split.test_indices);
            let fold_scores = inner.decision_function(&x_valid)?;
            for (&idx, &s) in split.test_indices.iter().zip(fold_scores.iter()) {
                scores[idx] = s;
            }
        }
        Ok(Some(scores))
    }

    /// Iteration cap for `n` training samples
    fn iteration_budget(&self, n: usize) -> usize {
        self.config
            .max_iter
            .unwrap_or_else(|| (100 * n).max(MIN_AUTO_ITERATIONS))
    }

    /// SMO on the dual with a maintained gradient and second-order working set selection
    fn smo_train(&self, x: &Array2<f64>, y: &Array1<f64>, bounds: &Array1<f64>) -> Result<SmoSolution> {
        let n = x.nrows();

        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(DxError::InvalidInput(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix. \
                 Consider subsampling or using a different algorithm.",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let kernel_matrix = self.compute_kernel_matrix(x);
        let budget = self.iteration_budget(n);
        let tol = self.config.tol;

        let mut alphas: Array1<f64> = Array1::zeros(n);
        // Gradient of 0.5 a'Qa - e'a with Q_ij = y_i y_j K_ij; zero alphas give -e
        let mut grad: Array1<f64> = Array1::from_elem(n, -1.0);

        let mut iterations = 0;
        let mut gap = f64::INFINITY;

        while iterations < budget {
            let (i, j, violation) = match select_working_set(&kernel_matrix, y, &alphas, &grad, bounds) {
                Some(pair) => pair,
                None => {
                    gap = 0.0;
                    break;
                }
            };
            gap = violation;
            if violation < tol {
                break;
            }

            let (c_i, c_j) = (bounds[i], bounds[j]);
            let (old_i, old_j) = (alphas[i], alphas[j]);
            let k_ii = kernel_matrix[[i, i]];
            let k_jj = kernel_matrix[[j, j]];
            let k_ij = kernel_matrix[[i, j]];
            let quad = positive_curvature(k_ii + k_jj - 2.0 * k_ij);

            let (mut a_i, mut a_j) = (old_i, old_j);
            if y[i] != y[j] {
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = old_i - old_j;
                a_i += delta;
                a_j += delta;
                if diff > 0.0 {
                    if a_j < 0.0 {
                        a_j = 0.0;
                        a_i = diff;
                    }
                } else if a_i < 0.0 {
                    a_i = 0.0;
                    a_j = -diff;
                }
                if diff > c_i - c_j {
                    if a_i > c_i {
                        a_i = c_i;
                        a_j = c_i - diff;
                    }
                } else if a_j > c_j {
                    a_j = c_j;
                    a_i = c_j + diff;
                }
            } else {
                let delta = (grad[i] - grad[j]) / quad;
                let sum = old_i + old_j;
                a_i -= delta;
                a_j += delta;
                if sum > c_i {
                    if a_i > c_i {
                        a_i = c_i;
                        a_j = sum - c_i;
                    }
                } else if a_j < 0.0 {
                    a_j = 0.0;
                    a_i = sum;
                }
                if sum > c_j {
                    if a_j > c_j {
                        a_j = c_j;
                        a_i = sum - c_j;
                    }
                } else if a_i < 0.0 {
                    a_i = 0.0;
                    a_j = sum;
                }
            }

            // G_k += Q_ki * d_i + Q_kj * d_j
            let d_i = y[i] * (a_i - old_i);
            let d_j = y[j] * (a_j - old_j);
            let row_i = kernel_matrix.row(i);
            let row_j = kernel_matrix.row(j);
            for k in 0..n {
                grad[k] += y[k] * (d_i * row_i[k] + d_j * row_j[k]);
            }

            alphas[i] = a_i;
            alphas[j] = a_j;
            iterations += 1;
        }

        if iterations >= budget && gap >= tol {
            warn!(
                c = self.config.c,
                n_samples = n,
                iterations,
                violation = gap,
                tol,
                "SMO stopped at the iteration cap before reaching the KKT tolerance"
            );
        }

        let bias = -intercept(y, &alphas, &grad, bounds);
        Ok(SmoSolution {
            alphas,
            bias,
            iterations,
            gap,
        })
    }

    /// Compute kernel matrix (parallelized for large datasets)
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let kernel = &self.config.kernel;

        // For small matrices, sequential is faster due to overhead
        if n < 100 {
            let mut k = Array2::zeros((n, n));
            for i in 0..n {
                for j in i..n {
                    let val = kernel.eval(x.row(i), x.row(j));
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return k;
        }

        // Parallel: compute upper triangle rows in parallel
        let rows: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| (i..n).map(|j| (j, kernel.eval(x.row(i), x.row(j)))).collect())
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row_vals) in rows.into_iter().enumerate() {
            for (j, val) in row_vals {
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn prepare(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(DxError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(DxError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        if let Some((row, col)) = first_non_finite(x) {
            return Err(DxError::NonFiniteFeature { column: format!("#{}", col), row });
        }
        match &self.scaler {
            Some(s) => s.transform(x),
            None => Ok(x.clone()),
        }
    }

    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x = self.prepare(x)?;

        if let Some(w) = &self.weights {
            return Ok(x.dot(w) + self.bias);
        }

        let sv = self.support_vectors.as_ref().ok_or(DxError::ModelNotFitted)?;
        let coef = self.dual_coef.as_ref().ok_or(DxError::ModelNotFitted)?;
        let scores = x
            .rows()
            .into_iter()
            .map(|sample| {
                sv.rows()
                    .into_iter()
                    .zip(coef.iter())
                    .map(|(v, &c)| c * self.config.kernel.eval(sample, v))
                    .sum::<f64>()
                    + self.bias
            })
            .collect();
        Ok(scores)
    }

    /// Hard 0/1 predictions (decision value >= 0 is positive)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(|s| if s >= 0.0 { 1.0 } else { 0.0 }))
    }

    /// Positive-class probabilities
    ///
    /// Platt-calibrated when the model was fitted with `probability`, otherwise
    /// the logistic of the raw decision value.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        match &self.calibrator {
            Some(platt) => platt.calibrate(&scores),
            None => Ok(scores.mapv(|v| 1.0 / (1.0 + (-v).exp()))),
        }
    }

    /// Mean accuracy on the given data
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        accuracy(y, &predictions)
    }

    /// Get number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map(|sv| sv.nrows()).unwrap_or(0)
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_some()
    }
}

fn has_both_classes(y: &Array1<f64>) -> bool {
    let n_pos = y.iter().filter(|&&v| v > 0.5).count();
    n_pos > 0 && n_pos < y.len()
}

fn first_non_finite(x: &Array2<f64>) -> Option<(usize, usize)> {
    x.indexed_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|((r, c), _)| (r, c))
}

/// Dual solution returned by SMO
#[derive(Debug, Clone)]
struct SmoSolution {
    alphas: Array1<f64>,
    bias: f64,
    iterations: usize,
    /// Maximal KKT violation when training stopped
    gap: f64,
}

const TAU: f64 = 1e-12;

fn positive_curvature(a: f64) -> f64 {
    if a > 0.0 {
        a
    } else {
        TAU
    }
}

/// Alpha may still move in the direction that raises y * alpha
fn in_up_set(y: f64, alpha: f64, bound: f64) -> bool {
    (y > 0.0 && alpha < bound) || (y < 0.0 && alpha > 0.0)
}

/// Alpha may still move in the direction that lowers y * alpha
fn in_low_set(y: f64, alpha: f64, bound: f64) -> bool {
    (y > 0.0 && alpha > 0.0) || (y < 0.0 && alpha < bound)
}

/// Second-order working set selection.
///
/// Returns the pair and the maximal violation `max(-y G) over up - min(-y G) over low`,
/// or `None` when either index set is empty.
fn select_working_set(
    kernel: &Array2<f64>,
    y: &Array1<f64>,
    alphas: &Array1<f64>,
    grad: &Array1<f64>,
    bounds: &Array1<f64>,
) -> Option<(usize, usize, f64)> {
    let n = y.len();

    let mut i = None;
    let mut g_max = f64::NEG_INFINITY;
    for t in 0..n {
        if in_up_set(y[t], alphas[t], bounds[t]) {
            let v = -y[t] * grad[t];
            if v > g_max {
                g_max = v;
                i = Some(t);
            }
        }
    }
    let i = i?;

    let mut j = None;
    let mut g_min = f64::INFINITY;
    let mut best_obj = f64::INFINITY;
    for t in 0..n {
        if !in_low_set(y[t], alphas[t], bounds[t]) {
            continue;
        }
        let v = -y[t] * grad[t];
        g_min = g_min.min(v);
        let b = g_max - v;
        if b > 0.0 {
            let a = positive_curvature(kernel[[i, i]] + kernel[[t, t]] - 2.0 * kernel[[i, t]]);
            let obj = -(b * b) / a;
            if obj < best_obj {
                best_obj = obj;
                j = Some(t);
            }
        }
    }

    if !g_min.is_finite() {
        return None;
    }
    match j {
        Some(j) => Some((i, j, g_max - g_min)),
        // Nothing violates against i, so the gap is already closed
        None => Some((i, i, (g_max - g_min).min(0.0))),
    }
}

/// rho with decision f(x) = sum a_i y_i K(x_i, x) - rho; free vectors average y G
fn intercept(y: &Array1<f64>, alphas: &Array1<f64>, grad: &Array1<f64>, bounds: &Array1<f64>) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut n_free = 0usize;

    for t in 0..y.len() {
        let yg = y[t] * grad[t];
        let at_upper = alphas[t] >= bounds[t];
        let at_lower = alphas[t] <= 0.0;
        if at_upper {
            if y[t] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if at_lower {
            if y[t] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            n_free += 1;
            free_sum += yg;
        }
    }

    if n_free > 0 {
        free_sum / n_free as f64
    } else {
        (upper + lower) / 2.0
    }
}

fn validate_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(DxError::ShapeError {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    if x.ncols() == 0 {
        return Err(DxError::InvalidInput("SVM needs at least one feature".to_string()));
    }
    if let Some(i) = y.iter().position(|&v| v != 0.0 && v != 1.0) {
        return Err(DxError::InvalidInput(format!(
            "SVM classifier requires 0/1 labels, but sample {} has label {}",
            i, y[i]
        )));
    }
    if !has_both_classes(y) {
        return Err(DxError::DegenerateClasses(
            "SVM training data must contain both classes".to_string(),
        ));
    }
    if let Some((row, col)) = first_non_finite(x) {
        return Err(DxError::NonFiniteFeature { column: format!("#{}", col), row });
    }
    Ok(())
}

//! Regularization sweep and final model selection

use crate::data::DesignMatrix;
use crate::error::{DxError, Result};
use crate::training::cross_validation::{k_fold_validate, CVStrategy, CrossValidator, FoldReport};
use crate::training::svm::{ClassWeight, SVMClassifier, SVMConfig};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Geometric grid of regularization strengths, `base^(i - offset)` for `i in 0..count`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterGrid {
    pub base: f64,
    pub offset: i32,
    pub count: usize,
}

impl Default for HyperparameterGrid {
    fn default() -> Self {
        Self {
            base: 1.5,
            offset: 15,
            count: 30,
        }
    }
}

impl HyperparameterGrid {
    pub fn new(base: f64, offset: i32, count: usize) -> Self {
        Self { base, offset, count }
    }

    /// C values in ascending order
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.base.powi(i as i32 - self.offset))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(DxError::ConfigError("hyperparameter grid is empty".to_string()));
        }
        if !(self.base.is_finite() && self.base > 0.0) {
            return Err(DxError::ConfigError(format!("grid base must be positive, got {}", self.base)));
        }
        Ok(())
    }
}

/// Settings of the classifier refit after the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalModelPolicy {
    /// Platt-calibrated probabilities on the refit model
    pub calibrated_probabilities: bool,
    /// Keep balanced class weights on the refit model
    pub balanced_class_weight: bool,
}

impl Default for FinalModelPolicy {
    fn default() -> Self {
        Self {
            calibrated_probabilities: true,
            balanced_class_weight: true,
        }
    }
}

impl FinalModelPolicy {
    /// Apply the policy to the configuration that won the sweep
    pub fn apply(&self, config: SVMConfig) -> SVMConfig {
        let class_weight = if self.balanced_class_weight {
            config.class_weight
        } else {
            ClassWeight::Uniform
        };
        config
            .with_probability(self.calibrated_probabilities)
            .with_class_weight(class_weight)
    }
}

/// Sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub grid: HyperparameterGrid,
    /// Template for every sweep candidate; `c` is overwritten per grid point
    pub base_svm: SVMConfig,
    pub cv: CVStrategy,
    /// Seed for shuffled fold strategies
    pub cv_random_state: Option<u64>,
    pub final_model: FinalModelPolicy,
    /// Evaluate grid points on the rayon pool
    pub parallel: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            grid: HyperparameterGrid::default(),
            base_svm: SVMConfig::linear_balanced(1.0),
            cv: CVStrategy::default(),
            cv_random_state: Some(42),
            final_model: FinalModelPolicy::default(),
            parallel: false,
        }
    }
}

impl SelectorConfig {
    pub fn with_grid(mut self, grid: HyperparameterGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_cv(mut self, cv: CVStrategy) -> Self {
        self.cv = cv;
        self
    }

    pub fn with_folds(mut self, k: usize) -> Self {
        self.cv = self.cv.with_n_splits(k);
        self
    }

    pub fn with_final_model(mut self, policy: FinalModelPolicy) -> Self {
        self.final_model = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn cross_validator(&self) -> CrossValidator {
        let cv = CrossValidator::new(self.cv.clone());
        match self.cv_random_state {
            Some(seed) => cv.with_random_state(seed),
            None => cv,
        }
    }
}

/// Per-candidate results in sweep order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepTrace {
    pub hps: Vec<f64>,
    pub aucs: Vec<f64>,
    pub accuracies: Vec<f64>,
}

impl SweepTrace {
    pub fn len(&self) -> usize {
        self.hps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hps.is_empty()
    }

    fn push(&mut self, c: f64, report: &FoldReport) {
        self.hps.push(c);
        self.aucs.push(report.auc);
        self.accuracies.push(report.mean_accuracy());
    }
}

/// A fitted classifier together with the columns it was trained on
#[derive(Debug, Clone)]
pub struct DiagnosticModel {
    pub classifier: SVMClassifier,
    pub feature_names: Vec<String>,
}

impl DiagnosticModel {
    pub fn c(&self) -> f64 {
        self.classifier.config().c
    }

    pub fn is_fitted(&self) -> bool {
        self.classifier.is_fitted()
    }
}

/// Result of a regularization sweep
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Winning configuration refit on the full training matrix
    pub model: DiagnosticModel,
    pub best_c: f64,
    pub best_auc: f64,
    pub trace: SweepTrace,
    /// Pooled out-of-fold labels and probabilities of the winner
    pub best_validation: (Array1<f64>, Array1<f64>),
}

/// Cross-validated sweep over the regularization grid
#[derive(Debug, Clone, Default)]
pub struct HyperparameterSelector {
    config: SelectorConfig,
}

impl HyperparameterSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Sweep the grid, keep the first candidate with the greatest pooled AUC,
    /// and refit it on all of `data`.
    pub fn select_best(&self, data: &DesignMatrix) -> Result<SelectionOutcome> {
        self.config.grid.validate()?;
        let start = Instant::now();
        let cv = self.config.cross_validator();

        let candidates: Vec<SVMConfig> = self
            .config
            .grid
            .iter()
            .map(|c| self.config.base_svm.clone().with_c(c))
            .collect();

        let reports: Vec<FoldReport> = if self.config.parallel {
            candidates
                .par_iter()
                .map(|cfg| k_fold_validate(data, cfg, &cv))
                .collect::<Result<Vec<_>>>()?
        } else {
            candidates
                .iter()
                .map(|cfg| k_fold_validate(data, cfg, &cv))
                .collect::<Result<Vec<_>>>()?
        };

        let mut trace = SweepTrace::default();
        for (cfg, report) in candidates.iter().zip(&reports) {
            debug!(c = cfg.c, auc = report.auc, "Sweep candidate");
            trace.push(cfg.c, report);
        }

        // Strict comparison keeps the first (smallest C) maximum
        let (best_idx, best_auc) = candidates
            .iter()
            .zip(&reports)
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (idx, (_, report))| match best {
                Some((_, best_auc)) if report.auc <= best_auc => best,
                _ => Some((idx, report.auc)),
            })
            .ok_or_else(|| DxError::ConfigError("hyperparameter grid is empty".to_string()))?;
        let winner = &reports[best_idx];
        let final_config = self.config.final_model.apply(candidates[best_idx].clone());
        let best_c = final_config.c;

        let mut classifier = SVMClassifier::new(final_config);
        classifier.fit(&data.x, &data.y)?;

        info!(
            best_c,
            best_auc,
            candidates = trace.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Hyperparameter sweep complete"
        );

        Ok(SelectionOutcome {
            model: DiagnosticModel {
                classifier,
                feature_names: data.feature_names.clone(),
            },
            best_c,
            best_auc,
            trace,
            best_validation: (winner.actual.clone(), winner.predicted.clone()),
        })
    }
}

//! Cross-validation splitting and pooled out-of-fold evaluation

use crate::data::DesignMatrix;
use crate::error::{DxError, Result};
use crate::evaluation::roc_auc;
use crate::training::svm::{SVMClassifier, SVMConfig};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation; without shuffling the folds are contiguous blocks
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 3, shuffle: false }
    }
}

impl CVStrategy {
    pub fn n_splits(&self) -> usize {
        match self {
            CVStrategy::KFold { n_splits, .. } | CVStrategy::StratifiedKFold { n_splits, .. } => *n_splits,
        }
    }

    /// Same strategy with a different fold count
    pub fn with_n_splits(&self, k: usize) -> Self {
        match self {
            CVStrategy::KFold { shuffle, .. } => CVStrategy::KFold { n_splits: k, shuffle: *shuffle },
            CVStrategy::StratifiedKFold { shuffle, .. } => {
                CVStrategy::StratifiedKFold { n_splits: k, shuffle: *shuffle }
            }
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn strategy(&self) -> &CVStrategy {
        &self.strategy
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        let n_splits = self.strategy.n_splits();
        if n_splits < 2 {
            return Err(DxError::ValidationError("n_splits must be at least 2".to_string()));
        }
        if n_samples < n_splits {
            return Err(DxError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => Ok(self.k_fold_split(n_samples, *n_splits, *shuffle)),
            CVStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    DxError::ValidationError("StratifiedKFold requires target array".to_string())
                })?;
                if y.len() != n_samples {
                    return Err(DxError::ShapeError {
                        expected: format!("{} labels", n_samples),
                        actual: format!("{} labels", y.len()),
                    });
                }
                Ok(self.stratified_k_fold_split(y, *n_splits, *shuffle))
            }
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Vec<CVSplit> {
        let mut indices: Vec<usize> = (0..n_samples).collect();

        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // The first n % k folds take one extra sample
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        splits
    }

    fn stratified_k_fold_split(&self, y: &Array1<f64>, n_splits: usize, shuffle: bool) -> Vec<CVSplit> {
        // Ordered map keeps fold assignment independent of hashing
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if shuffle {
            let mut rng = self.rng();
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut next_fold = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[next_fold].push(idx);
                next_fold = (next_fold + 1) % n_splits;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }

        (0..n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect()
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

/// Out-of-fold results for one classifier configuration
#[derive(Debug, Clone)]
pub struct FoldReport {
    /// Per-fold validation accuracy
    pub accuracy: CVResults,
    /// ROC-AUC of the pooled out-of-fold probabilities
    pub auc: f64,
    /// Validation labels, concatenated in fold order
    pub actual: Array1<f64>,
    /// Positive-class probabilities aligned with `actual`
    pub predicted: Array1<f64>,
}

impl FoldReport {
    pub fn mean_accuracy(&self) -> f64 {
        self.accuracy.mean_score
    }
}

/// Fit a fresh classifier per fold and pool the validation predictions.
///
/// AUC is computed once over the pooled predictions, so a validation fold
/// holding a single class still contributes.
pub fn k_fold_validate(data: &DesignMatrix, config: &SVMConfig, cv: &CrossValidator) -> Result<FoldReport> {
    let splits = cv.split(data.n_samples(), Some(&data.y))?;

    let mut fold_scores = Vec::with_capacity(splits.len());
    let mut actual = Vec::with_capacity(data.n_samples());
    let mut predicted = Vec::with_capacity(data.n_samples());

    for split in &splits {
        let (x_train, y_train) = data.rows(&split.train_indices);
        let (x_valid, y_valid) = data.rows(&split.test_indices);

        let mut clf = SVMClassifier::new(config.clone());
        clf.fit(&x_train, &y_train).map_err(|e| {
            warn!(fold = split.fold_idx, c = config.c, error = %e, "Fold fit failed");
            e
        })?;

        fold_scores.push(clf.score(&x_valid, &y_valid)?);
        actual.extend(y_valid.iter().copied());
        predicted.extend(clf.predict_proba(&x_valid)?.iter().copied());
    }

    let actual = Array1::from_vec(actual);
    let predicted = Array1::from_vec(predicted);
    let auc = roc_auc(&actual, &predicted)?;
    let accuracy = CVResults::from_scores(fold_scores);

    debug!(c = config.c, auc, mean_accuracy = accuracy.mean_score, "Cross-validated configuration");

    Ok(FoldReport {
        accuracy,
        auc,
        actual,
        predicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100, None).unwrap();

        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        // All indices should be covered exactly once in test sets
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_blocks_with_remainder() {
        let cv = CrossValidator::new(CVStrategy::default());
        let splits = cv.split(10, None).unwrap();

        assert_eq!(splits[0].test_indices, vec![0, 1, 2, 3]);
        assert_eq!(splits[1].test_indices, vec![4, 5, 6]);
        assert_eq!(splits[2].test_indices, vec![7, 8, 9]);
        assert_eq!(splits[1].train_indices, vec![0, 1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn test_shuffled_k_fold_is_seeded() {
        let strategy = CVStrategy::KFold { n_splits: 4, shuffle: true };
        let a = CrossValidator::new(strategy.clone()).with_random_state(7).split(20, None).unwrap();
        let b = CrossValidator::new(strategy).with_random_state(7).split(20, None).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![
            0.0, 0.0, 0.0, 0.0, 0.0,
            1.0, 1.0, 1.0, 1.0, 1.0,
        ]);

        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 5, shuffle: false });
        let splits = cv.split(10, Some(&y)).unwrap();

        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let positives = split.test_indices.iter().filter(|&&i| y[i] > 0.5).count();
            assert_eq!(positives, 1);
        }
    }

    #[test]
    fn test_invalid_split_counts() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 1, shuffle: false });
        assert!(matches!(cv.split(10, None), Err(DxError::ValidationError(_))));

        let cv = CrossValidator::new(CVStrategy::default());
        assert!(matches!(cv.split(2, None), Err(DxError::ValidationError(_))));
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.5, 1.0]);
        assert_eq!(results.mean_score, 0.75);
        assert_eq!(results.std_score, 0.25);
        assert_eq!(results.n_folds, 2);
    }
}

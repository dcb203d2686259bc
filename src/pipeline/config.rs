//! Study configuration

use crate::data::{FeatureConfig, DEFAULT_MIRNAS};
use crate::error::{DxError, Result};
use crate::preprocessing::PreprocessingConfig;
use crate::training::SelectorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a study run needs besides the two tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Diagnosis treated as the positive class, e.g. `TBM` or `PTB`
    pub positive_label: String,
    /// miRNA feature columns
    pub mirnas: Vec<String>,
    pub train_file: String,
    pub test_file: String,
    pub preprocessing: PreprocessingConfig,
    pub features: FeatureConfig,
    pub selector: SelectorConfig,
    /// Run the three feature subsets concurrently
    pub parallel_subsets: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            positive_label: String::new(),
            mirnas: DEFAULT_MIRNAS.iter().map(|m| m.to_string()).collect(),
            train_file: "train_df.csv".to_string(),
            test_file: "test_df.csv".to_string(),
            preprocessing: PreprocessingConfig::default(),
            features: FeatureConfig::default(),
            selector: SelectorConfig::default(),
            parallel_subsets: false,
        }
    }
}

impl StudyConfig {
    pub fn new(positive_label: &str) -> Self {
        Self {
            positive_label: positive_label.to_string(),
            ..Default::default()
        }
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn with_positive_label(mut self, label: &str) -> Self {
        self.positive_label = label.to_string();
        self
    }

    pub fn with_mirnas(mut self, mirnas: Vec<String>) -> Self {
        self.mirnas = mirnas;
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_folds(mut self, k: usize) -> Self {
        self.selector = self.selector.with_folds(k);
        self
    }

    pub fn with_parallel_subsets(mut self, parallel: bool) -> Self {
        self.parallel_subsets = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.positive_label.is_empty() {
            return Err(DxError::ConfigError("positive label is required".to_string()));
        }
        if self.mirnas.is_empty() {
            return Err(DxError::ConfigError("at least one miRNA column is required".to_string()));
        }
        if self.selector.cv.n_splits() < 2 {
            return Err(DxError::ConfigError(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.selector.cv.n_splits()
            )));
        }
        self.selector.grid.validate()
    }
}

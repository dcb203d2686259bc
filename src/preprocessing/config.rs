//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// A single `from -> to` rewrite, used for column names and cell values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub from: String,
    pub to: String,
}

impl RenameRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// Configuration for table preprocessing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Column renames applied before anything else
    pub column_renames: Vec<RenameRule>,

    /// Columns whose name contains this marker are dropped
    /// (index columns written by naive CSV export)
    pub artifact_marker: String,

    /// Whole-cell rewrites applied to every text column
    pub value_rewrites: Vec<RenameRule>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            column_renames: vec![
                RenameRule::new("Hct", "hematocrit"),
                RenameRule::new("L", "lymphocyte"),
                RenameRule::new("N", "neutrophil"),
                RenameRule::new("M", "monocyte"),
                RenameRule::new("Hb", "hemoglobin"),
                RenameRule::new("Alb", "albumin"),
            ],
            artifact_marker: "Unnamed".to_string(),
            value_rewrites: vec![RenameRule::new("meningitis", "other meningitis")],
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that leaves tables untouched
    pub fn empty() -> Self {
        Self {
            column_renames: Vec::new(),
            artifact_marker: String::new(),
            value_rewrites: Vec::new(),
        }
    }

    /// Builder method to replace the column rename rules
    pub fn with_column_renames(mut self, rules: Vec<RenameRule>) -> Self {
        self.column_renames = rules;
        self
    }

    /// Builder method to add a column rename rule
    pub fn with_column_rename(mut self, from: &str, to: &str) -> Self {
        self.column_renames.push(RenameRule::new(from, to));
        self
    }

    /// Builder method to set the artifact column marker
    pub fn with_artifact_marker(mut self, marker: &str) -> Self {
        self.artifact_marker = marker.to_string();
        self
    }

    /// Builder method to replace the value rewrite rules
    pub fn with_value_rewrites(mut self, rules: Vec<RenameRule>) -> Self {
        self.value_rewrites = rules;
        self
    }
}

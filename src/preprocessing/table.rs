//! Table-level cleanup: column renames, artifact removal, value rewrites

use super::PreprocessingConfig;
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Applies [`PreprocessingConfig`] to a loaded table.
///
/// `preprocess` never mutates its input; callers work with the returned table.
#[derive(Debug, Clone, Default)]
pub struct TablePreprocessor {
    config: PreprocessingConfig,
}

impl TablePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Rename columns, drop artifact columns, then rewrite label values
    pub fn preprocess(&self, df: &DataFrame) -> Result<DataFrame> {
        let renamed = self.rename_columns(df)?;
        let trimmed = self.drop_artifact_columns(&renamed)?;
        self.rewrite_values(&trimmed)
    }

    /// Apply the configured column renames, skipping absent columns
    pub fn rename_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for rule in &self.config.column_renames {
            if !has_column(&out, &rule.from) {
                continue;
            }
            if has_column(&out, &rule.to) {
                warn!(from = %rule.from, to = %rule.to, "Rename target already present, keeping original column");
                continue;
            }
            out.rename(&rule.from, rule.to.as_str().into())?;
            debug!(from = %rule.from, to = %rule.to, "Renamed column");
        }
        Ok(out)
    }

    /// Drop every column whose name contains the artifact marker
    pub fn drop_artifact_columns(&self, df: &DataFrame) -> Result<DataFrame> {
        let marker = self.config.artifact_marker.as_str();
        if marker.is_empty() {
            return Ok(df.clone());
        }

        let artifacts: Vec<String> = column_names(df)
            .into_iter()
            .filter(|name| name.contains(marker))
            .collect();

        let mut out = df.clone();
        for name in &artifacts {
            // Earlier drops never remove later names, but stay tolerant of it
            if has_column(&out, name) {
                out = out.drop(name)?;
                debug!(column = %name, "Dropped artifact column");
            }
        }
        Ok(out)
    }

    /// Rewrite whole cell values in every text column
    pub fn rewrite_values(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.config.value_rewrites.is_empty() {
            return Ok(df.clone());
        }

        let mut replacements: Vec<Series> = Vec::new();
        for column in df.get_columns() {
            if column.dtype() != &DataType::String {
                continue;
            }
            let ca = column.str()?;
            let mut changed = 0usize;
            let values: Vec<Option<String>> = ca
                .into_iter()
                .map(|value| {
                    value.map(|s| match self.config.value_rewrites.iter().find(|r| r.from == s) {
                        Some(rule) => {
                            changed += 1;
                            rule.to.clone()
                        }
                        None => s.to_string(),
                    })
                })
                .collect();
            if changed > 0 {
                debug!(column = %column.name(), rewritten = changed, "Rewrote categorical values");
                replacements.push(Series::new(column.name().clone(), values));
            }
        }

        let mut out = df.clone();
        for series in replacements {
            out.with_column(series)?;
        }
        Ok(out)
    }
}

/// Column names of a table as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

//! Feature subsets, label construction and design matrices

use crate::error::{DxError, Result};
use crate::preprocessing::column_names;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six exosomal microRNAs measured in the cohort
pub const DEFAULT_MIRNAS: [&str; 6] = ["miR-20a", "miR-20b", "miR-26a", "miR-106a", "miR-191", "miR-486"];

/// How missing or non-numeric feature cells are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Fail with `NonFiniteFeature`
    #[default]
    Reject,
    /// Replace with the column mean of the same table
    FillMean,
    /// Replace with the column median of the same table
    FillMedian,
}

/// Which columns are labels rather than features
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Categorical diagnosis column
    pub label_column: String,
    /// Metadata columns never used as features
    pub excluded_columns: Vec<String>,
    pub missing_values: MissingValuePolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            label_column: "group".to_string(),
            excluded_columns: vec!["group property".to_string()],
            missing_values: MissingValuePolicy::Reject,
        }
    }
}

impl FeatureConfig {
    pub fn with_missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    /// Label column followed by excluded columns
    pub fn non_feature_columns(&self) -> Vec<&str> {
        std::iter::once(self.label_column.as_str())
            .chain(self.excluded_columns.iter().map(String::as_str))
            .collect()
    }

    fn is_feature(&self, name: &str) -> bool {
        !self.non_feature_columns().contains(&name)
    }
}

/// Feature subsets compared in the study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSubset {
    /// EHR and miRNA features together
    Combined,
    /// Everything except the miRNA columns
    EhrOnly,
    /// Only the miRNA columns
    MirnaOnly,
}

impl FeatureSubset {
    /// Run order used by the study
    pub const ALL: [FeatureSubset; 3] = [FeatureSubset::Combined, FeatureSubset::EhrOnly, FeatureSubset::MirnaOnly];

    /// Heading used in reports
    pub fn title(&self) -> &'static str {
        match self {
            FeatureSubset::Combined => "EHR + miRNAs modelling",
            FeatureSubset::EhrOnly => "EHR only modelling",
            FeatureSubset::MirnaOnly => "miRNAs only modelling",
        }
    }

    /// Columns of `df` that belong to this subset, label columns included
    pub fn columns(&self, df: &DataFrame, mirnas: &[String], features: &FeatureConfig) -> Result<Vec<String>> {
        let all = column_names(df);
        let is_mirna = |name: &str| mirnas.iter().any(|m| m == name);

        match self {
            FeatureSubset::Combined => Ok(all),
            FeatureSubset::EhrOnly => Ok(all.into_iter().filter(|c| !is_mirna(c)).collect()),
            FeatureSubset::MirnaOnly => {
                let mut cols = Vec::with_capacity(mirnas.len() + 2);
                for mirna in mirnas {
                    if !all.contains(mirna) {
                        return Err(DxError::FeatureNotFound(mirna.clone()));
                    }
                    cols.push(mirna.clone());
                }
                cols.extend(all.into_iter().filter(|c| !features.is_feature(c)));
                Ok(cols)
            }
        }
    }

    /// Project `df` onto this subset
    pub fn select(&self, df: &DataFrame, mirnas: &[String], features: &FeatureConfig) -> Result<DataFrame> {
        let cols = self.columns(df, mirnas, features)?;
        Ok(df.select(cols)?)
    }
}

impl fmt::Display for FeatureSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureSubset::Combined => "combined",
            FeatureSubset::EhrOnly => "ehr-only",
            FeatureSubset::MirnaOnly => "mirna-only",
        };
        f.write_str(name)
    }
}

/// Numeric features and binary labels ready for a classifier
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl DesignMatrix {
    /// Build from a table using every non-label column as a feature
    pub fn from_frame(df: &DataFrame, positive_label: &str, features: &FeatureConfig) -> Result<Self> {
        let feature_names: Vec<String> = column_names(df)
            .into_iter()
            .filter(|c| features.is_feature(c))
            .collect();
        Self::from_frame_with_columns(df, &feature_names, positive_label, features)
    }

    /// Build from a table using the given feature columns, in that order
    pub fn from_frame_with_columns(
        df: &DataFrame,
        feature_names: &[String],
        positive_label: &str,
        features: &FeatureConfig,
    ) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(DxError::InvalidInput("no feature columns selected".to_string()));
        }
        let y = binary_labels(df, &features.label_column, positive_label)?;
        let x = columns_to_array2(df, feature_names, features.missing_values)?;
        Ok(Self {
            x,
            y,
            feature_names: feature_names.to_vec(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_positive(&self) -> usize {
        self.y.iter().filter(|&&v| v > 0.5).count()
    }

    /// Rows at `indices`, in that order
    pub fn rows(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (self.x.select(Axis(0), indices), self.y.select(Axis(0), indices))
    }
}

/// 1.0 where the label column equals `positive_label`, else 0.0
pub fn binary_labels(df: &DataFrame, label_column: &str, positive_label: &str) -> Result<Array1<f64>> {
    let column = df
        .column(label_column)
        .map_err(|_| DxError::FeatureNotFound(label_column.to_string()))?;
    let as_text = column.cast(&DataType::String)?;
    let labels = as_text
        .str()?
        .into_iter()
        .map(|v| if v == Some(positive_label) { 1.0 } else { 0.0 })
        .collect();
    Ok(labels)
}

/// Check that the positive label occurs and that negatives remain
pub fn validate_labels(y: &Array1<f64>, positive_label: &str) -> Result<()> {
    let n_pos = y.iter().filter(|&&v| v > 0.5).count();
    if n_pos == 0 {
        return Err(DxError::UnknownPositiveLabel { label: positive_label.to_string() });
    }
    if n_pos == y.len() {
        return Err(DxError::DegenerateClasses(format!(
            "every record is labelled '{}', no negatives to contrast",
            positive_label
        )));
    }
    Ok(())
}

/// Extract named columns into a row-major matrix, applying the missing value policy
fn columns_to_array2(df: &DataFrame, col_names: &[String], policy: MissingValuePolicy) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| DxError::FeatureNotFound(col_name.clone()))?;
            let as_f64 = column.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            fill_missing(col_name, values, policy)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_refs[c][r]))
}

fn fill_missing(column: &str, values: Vec<Option<f64>>, policy: MissingValuePolicy) -> Result<Vec<f64>> {
    let fill = match policy {
        MissingValuePolicy::Reject => {
            if let Some(row) = values.iter().position(Option::is_none) {
                return Err(DxError::NonFiniteFeature { column: column.to_string(), row });
            }
            0.0
        }
        MissingValuePolicy::FillMean => {
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            if observed.is_empty() {
                0.0
            } else {
                observed.iter().sum::<f64>() / observed.len() as f64
            }
        }
        MissingValuePolicy::FillMedian => {
            let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
            observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            match observed.len() {
                0 => 0.0,
                n if n % 2 == 1 => observed[n / 2],
                n => (observed[n / 2 - 1] + observed[n / 2]) / 2.0,
            }
        }
    };
    Ok(values.into_iter().map(|v| v.unwrap_or(fill)).collect())
}

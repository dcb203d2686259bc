//! Data preprocessing module
//!
//! Provides table cleanup ahead of modelling:
//! - Renaming abbreviated EHR columns to clinical names
//! - Dropping index artifact columns
//! - Canonicalizing categorical label values
//!
//! and z-score scaling of design matrices.

mod config;
mod scaler;
mod table;

pub use config::{PreprocessingConfig, RenameRule};
pub use scaler::StandardScaler;
pub use table::{column_names, TablePreprocessor};

use crate::error::Result;
use polars::prelude::DataFrame;

/// Preprocess a table with the default configuration
pub fn preprocess(df: &DataFrame) -> Result<DataFrame> {
    TablePreprocessor::new().preprocess(df)
}

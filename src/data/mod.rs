//! Study tables: CSV loading, feature subsets and design matrices

mod features;
mod loader;

pub use features::{
    binary_labels, validate_labels, DesignMatrix, FeatureConfig, FeatureSubset, MissingValuePolicy, DEFAULT_MIRNAS,
};
pub use loader::DataLoader;

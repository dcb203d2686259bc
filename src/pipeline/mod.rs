//! End-to-end study over the combined, EHR-only and miRNA-only feature subsets

mod config;
mod report;
mod study;

pub use config::StudyConfig;
pub use report::{StudyReport, SubsetReport};
pub use study::DiagnosticStudy;

//! Study results and their text rendering

use crate::data::FeatureSubset;
use crate::evaluation::OperatingPoint;
use crate::training::SweepTrace;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Outcome of modelling one feature subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetReport {
    pub subset: FeatureSubset,
    pub n_features: usize,
    pub best_c: f64,
    /// Pooled out-of-fold AUC of the selected C
    pub validation_auc: f64,
    pub test_auc: f64,
    /// Youden-optimal point on the pooled validation predictions
    pub validation: OperatingPoint,
    /// Youden-optimal point on the test predictions
    pub test: OperatingPoint,
    pub trace: SweepTrace,
}

/// Results of all subsets, in run order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub positive_label: String,
    pub subsets: Vec<SubsetReport>,
}

impl StudyReport {
    pub fn get(&self, subset: FeatureSubset) -> Option<&SubsetReport> {
        self.subsets.iter().find(|r| r.subset == subset)
    }

    /// Human-readable summary, one block per subset
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (idx, report) in self.subsets.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", idx, report.subset.title());
            let _ = writeln!(
                out,
                "Validation: Sensitivity:\t{:.3} Specificity:\t{:.3}",
                report.validation.sensitivity, report.validation.specificity
            );
            let _ = writeln!(
                out,
                "Testing: Sensitivity:\t{:.3} Specificity:\t{:.3}",
                report.test.sensitivity, report.test.specificity
            );
            let _ = writeln!(
                out,
                "Best C: {:.4}\tValidation AUC: {:.3}\tTest AUC: {:.3}",
                report.best_c, report.validation_auc, report.test_auc
            );
        }
        out
    }

    /// C/AUC pairs of every sweep, one line per candidate
    pub fn render_trace(&self) -> String {
        let mut out = String::new();
        for report in &self.subsets {
            let _ = writeln!(out, "[{}]", report.subset);
            for ((c, auc), acc) in report
                .trace
                .hps
                .iter()
                .zip(report.trace.aucs.iter())
                .zip(report.trace.accuracies.iter())
            {
                let _ = writeln!(out, "C={:.6}\tAUC={:.3}\tAccuracy={:.3}", c, auc, acc);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(sensitivity: f64, specificity: f64) -> OperatingPoint {
        OperatingPoint {
            threshold: 0.5,
            sensitivity,
            specificity,
        }
    }

    fn report() -> StudyReport {
        let subsets = FeatureSubset::ALL
            .iter()
            .map(|&subset| SubsetReport {
                subset,
                n_features: 3,
                best_c: 1.5,
                validation_auc: 0.9,
                test_auc: 0.8,
                validation: point(0.8, 0.75),
                test: point(2.0 / 3.0, 1.0),
                trace: SweepTrace {
                    hps: vec![1.0, 1.5],
                    aucs: vec![0.85, 0.9],
                    accuracies: vec![0.7, 0.8],
                },
            })
            .collect();
        StudyReport {
            positive_label: "TBM".to_string(),
            subsets,
        }
    }

    #[test]
    fn test_render_layout() {
        let text = report().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "0. EHR + miRNAs modelling");
        assert_eq!(lines[1], "Validation: Sensitivity:\t0.800 Specificity:\t0.750");
        assert_eq!(lines[2], "Testing: Sensitivity:\t0.667 Specificity:\t1.000");
        assert_eq!(lines[4], "1. EHR only modelling");
        assert_eq!(lines[8], "2. miRNAs only modelling");
    }

    #[test]
    fn test_render_trace() {
        let text = report().render_trace();
        assert!(text.starts_with("[combined]\n"));
        assert!(text.contains("C=1.500000\tAUC=0.900\tAccuracy=0.800"));
    }

    #[test]
    fn test_lookup() {
        let report = report();
        assert_eq!(report.get(FeatureSubset::MirnaOnly).map(|r| r.subset), Some(FeatureSubset::MirnaOnly));
    }
}

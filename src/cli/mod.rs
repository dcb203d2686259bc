//! mirna-dx CLI Module
//!
//! Command-line interface for running the diagnostic study on a data folder.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::DataLoader;
use crate::pipeline::{DiagnosticStudy, StudyConfig, StudyReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────
// Progress goes to stderr so stdout carries only the report.

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    eprint!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    eprintln!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mirna-dx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-validated SVM diagnosis from exosomal miRNA and EHR features")]
#[command(long_about = None)]
pub struct Cli {
    /// Folder holding the training and testing tables
    #[arg(long)]
    pub data_folder: PathBuf,

    /// Diagnosis treated as positive, e.g. TBM or PTB
    #[arg(long)]
    pub positive_label: String,

    /// JSON study configuration; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Model the three feature subsets concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Print the C/AUC sweep of every subset
    #[arg(long)]
    pub trace: bool,
}

impl Cli {
    /// Merge the optional config file with the flags
    pub fn study_config(&self) -> anyhow::Result<StudyConfig> {
        let mut config = match &self.config {
            Some(path) => StudyConfig::from_json_file(path)?,
            None => StudyConfig::default(),
        };
        config = config.with_positive_label(&self.positive_label);
        if let Some(k) = self.folds {
            config = config.with_folds(k);
        }
        if self.parallel {
            config = config.with_parallel_subsets(true);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Load the tables, run every subset and print the report
pub fn cmd_run(cli: &Cli) -> anyhow::Result<StudyReport> {
    let config = cli.study_config()?;
    section("Diagnostic study");
    eprintln!("  {}", kv("Positive label", &config.positive_label));
    eprintln!("  {}", kv("Folds", &config.selector.cv.n_splits().to_string()));

    step_run("Loading data");
    let start = Instant::now();
    let (train, test) = DataLoader::new().load_split(&cli.data_folder, &config.train_file, &config.test_file)?;
    step_done(&format!(
        "{} train rows, {} test rows in {:?}",
        train.height(),
        test.height(),
        start.elapsed()
    ));

    step_run(&format!("Modelling {} subsets", "3".cyan()));
    let start = Instant::now();
    let report = DiagnosticStudy::new(config).run(&train, &test)?;
    step_done(&format!("{:?}", start.elapsed()));
    eprintln!();

    print!("{}", report.render());
    if cli.trace {
        print!("{}", report.render_trace());
    }

    Ok(report)
}

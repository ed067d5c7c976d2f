//! Iris trainer CLI
//!
//! Deterministic offline trainer: reads a labeled CSV, fits Gaussian Naive
//! Bayes on a seeded hold-out split and writes the model artifact, the
//! metrics record and the species mapping.

use anyhow::{Context, Result};
use clap::Parser;
use iris_core::metrics::MetricsRecord;
use iris_core::telemetry::init_tracing;
use iris_core::{IrisConfig, IrisTrainer, LabelCodec, TrainingOutcome};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "iris-train")]
#[command(author = "Iris Classifier Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the Iris Gaussian Naive Bayes classifier", long_about = None)]
struct Args {
    /// Input CSV with a label column and four measurement columns
    #[arg(short, long)]
    csv: Option<PathBuf>,

    /// Model artifact output path
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// Metrics record output path
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Species mapping output path
    #[arg(long)]
    mapping_out: Option<PathBuf>,

    /// Configuration file (defaults to ./iris.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,

    /// Seed for the deterministic shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Skip shuffling; the first rows form the test partition
    #[arg(long)]
    no_shuffle: bool,

    /// Gaussian NB variance smoothing
    #[arg(long)]
    var_smoothing: Option<f64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut IrisConfig) {
        if let Some(csv) = &self.csv {
            config.paths.csv = csv.clone();
        }
        if let Some(path) = &self.model_out {
            config.paths.model = path.clone();
        }
        if let Some(path) = &self.metrics_out {
            config.paths.metrics = path.clone();
        }
        if let Some(path) = &self.mapping_out {
            config.paths.mapping = path.clone();
        }
        if let Some(test_size) = self.test_size {
            config.training.test_size = test_size;
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }
        if self.no_shuffle {
            config.training.shuffle = false;
        }
        if let Some(var_smoothing) = self.var_smoothing {
            config.training.var_smoothing = var_smoothing;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = IrisConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&config.logging.level, args.verbose).map_err(anyhow::Error::msg)?;

    info!("Iris Gaussian NB Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");

    let trainer = IrisTrainer::new(config.training_config(), LabelCodec::iris());
    let outcome = trainer
        .train_csv(&config.paths.csv)
        .with_context(|| format!("Training on {} failed", config.paths.csv.display()))?;

    log_summary(&outcome);

    let paths = config.output_paths();
    outcome.save(&paths).context("Failed to persist training outputs")?;

    info!("═══════════════════════════════════════════");
    info!("Training complete!");
    info!("  Model:   {}", paths.model.display());
    info!("  Metrics: {}", paths.metrics.display());
    info!("  Mapping: {}", paths.mapping.display());

    Ok(())
}

fn log_summary(outcome: &TrainingOutcome) {
    let metrics: &MetricsRecord = &outcome.metrics;

    info!("Feature order: {}", metrics.feature_columns.join(", "));
    info!("Accuracy (test): {:.4}", metrics.accuracy);
    info!("Classification report:");
    info!("  {:<14} {:>9} {:>9} {:>9} {:>8}", "", "precision", "recall", "f1-score", "support");
    for name in &metrics.target_names {
        if let Some(m) = metrics.class_metrics(name) {
            info!(
                "  {:<14} {:>9.4} {:>9.4} {:>9.4} {:>8}",
                name, m.precision, m.recall, m.f1_score, m.support
            );
        }
    }
    let report = &metrics.classification_report;
    for (label, m) in [("macro avg", &report.macro_avg), ("weighted avg", &report.weighted_avg)] {
        info!(
            "  {:<14} {:>9.4} {:>9.4} {:>9.4} {:>8}",
            label, m.precision, m.recall, m.f1_score, m.support
        );
    }

    info!("Confusion matrix (rows = true, cols = predicted; labels {:?}):", metrics.labels);
    for row in &metrics.confusion_matrix {
        info!("  {:?}", row);
    }
}

//! Iris classifier command line interface
//!
//! `predict` prints the prediction as JSON, `pretty` renders it with colors
//! and tables, `report` shows the metrics of the last training run.

mod input;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use iris_core::telemetry::init_tracing;
use iris_core::{IrisConfig, MetricsRecord, Predictor, RawInput};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "iris-cli")]
#[command(about = "Predict Iris species from the trained model artifact", long_about = None)]
#[command(version)]
struct Cli {
    /// Model artifact path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Metrics record path (used by `report`)
    #[arg(long, global = true)]
    metrics: Option<PathBuf>,

    /// Configuration file (defaults to ./iris.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict and print the result as JSON
    Predict(PredictArgs),
    /// Predict with a colored summary, input and probability tables
    Pretty(PrettyArgs),
    /// Show the metrics of the last training run
    Report,
}

#[derive(Args)]
struct InputArgs {
    /// Four values in the model's feature order, e.g. "5.1,3.5,1.4,0.2"
    /// (use ';' as separator to write decimals with ',')
    #[arg(long, conflicts_with = "json")]
    values: Option<String>,

    /// JSON object keyed by feature name, e.g. '{"sepal_length": 5.1, ...}'
    #[arg(long)]
    json: Option<String>,
}

#[derive(Args)]
struct PredictArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Include per-class probabilities
    #[arg(long)]
    probs: bool,
}

#[derive(Args)]
struct PrettyArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Hide the probability table
    #[arg(long)]
    no_probs: bool,
}

impl InputArgs {
    /// Raw input from flags, or `None` when the user should be prompted.
    fn raw_input(&self) -> Result<Option<RawInput>> {
        if let Some(values) = &self.values {
            return Ok(Some(RawInput::from_values_arg(values)));
        }
        if let Some(json) = &self.json {
            return Ok(Some(RawInput::from_json_str(json)?));
        }
        Ok(None)
    }
}

fn load_predictor(path: &Path) -> Result<Predictor> {
    let predictor = Predictor::load(path)?;
    debug!(
        "Loaded model artifact from {} (features: {})",
        path.display(),
        predictor.feature_columns().join(", ")
    );
    Ok(predictor)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = IrisConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.paths.model = model;
    }
    if let Some(metrics) = cli.metrics {
        config.paths.metrics = metrics;
    }

    init_tracing(&config.logging.level, cli.verbose).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Predict(args) => {
            let predictor = load_predictor(&config.paths.model)?;
            let input = match args.input.raw_input()? {
                Some(input) => input,
                None => {
                    debug!("No --values/--json given; prompting on stdin");
                    input::prompt_plain(predictor.feature_columns())?
                }
            };
            let prediction = predictor.predict(&input, args.probs)?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        Commands::Pretty(args) => {
            output::banner();
            let predictor = load_predictor(&config.paths.model)?;
            let input = match args.input.raw_input()? {
                Some(input) => input,
                None => {
                    debug!("No --values/--json given; prompting interactively");
                    input::prompt_validated(predictor.feature_columns())?
                }
            };
            let prediction = predictor.predict(&input, !args.no_probs)?;
            output::render_prediction(&prediction);
        }
        Commands::Report => {
            let metrics = MetricsRecord::load(&config.paths.metrics)?;
            output::render_report(&metrics, &config.paths.metrics);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

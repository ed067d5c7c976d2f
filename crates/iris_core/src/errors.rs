//! Error types for the Iris core crate

use crate::schema::FeatureSlot;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A raw table cannot be mapped onto the label codec or the feature schema.
///
/// Always fatal to the current training run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("label column not found (looked for {expected:?}); columns in CSV: {available:?}")]
    MissingLabelColumn {
        expected: Vec<String>,
        available: Vec<String>,
    },

    #[error("unexpected values in label column: {0:?}")]
    UnknownLabels(Vec<String>),

    #[error("missing slot {slot}: no column matches it; columns in CSV: {available:?}")]
    MissingFeature {
        slot: FeatureSlot,
        available: Vec<String>,
    },

    #[error("column '{column}', row {row}: '{value}' is not a number")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("dataset has no rows")]
    EmptyDataset,
}

/// One problem found while validating prediction input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputProblem {
    /// A required base feature key is absent from keyed input.
    MissingFeature { slot: String },
    /// A field did not parse as a float after decimal-separator normalization.
    InvalidNumber { field: String, value: String },
    /// Positional input did not carry exactly one value per feature.
    WrongArity { expected: usize, got: usize },
    /// Input could not be interpreted at all (e.g. JSON that is not an object).
    Malformed(String),
}

impl fmt::Display for InputProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputProblem::MissingFeature { slot } => write!(f, "missing feature {slot}"),
            InputProblem::InvalidNumber { field, value } => {
                write!(f, "{field}: invalid number '{value}' (use a point or a comma as decimal separator)")
            }
            InputProblem::WrongArity { expected, got } => {
                write!(f, "expected exactly {expected} values, got {got}")
            }
            InputProblem::Malformed(reason) => write!(f, "malformed input: {reason}"),
        }
    }
}

/// Malformed or incomplete prediction input.
///
/// Recoverable by the caller; carries every problem found in one pass.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid prediction input: {}", join_problems(.problems))]
pub struct InputError {
    pub problems: Vec<InputProblem>,
}

impl InputError {
    pub fn new(problems: Vec<InputProblem>) -> Self {
        Self { problems }
    }

    pub fn single(problem: InputProblem) -> Self {
        Self {
            problems: vec![problem],
        }
    }

    /// Field names (or slots) mentioned by the collected problems.
    pub fn fields(&self) -> Vec<&str> {
        self.problems
            .iter()
            .filter_map(|p| match p {
                InputProblem::MissingFeature { slot } => Some(slot.as_str()),
                InputProblem::InvalidNumber { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn join_problems(problems: &[InputProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The persisted model artifact is missing, unreadable or incomplete.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact not found: {}. Run `iris-train` first", path.display())]
    NotFound { path: PathBuf },

    #[error("model artifact {} is corrupt: {reason}. Re-run `iris-train`", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to write model artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures raised by a classifier capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier has not been fitted")]
    NotFitted,

    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("feature rows ({rows}) and labels ({labels}) differ in length")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("expected {expected} features per row, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("need at least 2 classes to fit, got {0}")]
    TooFewClasses(usize),

    #[error("feature {feature} of class {class} has zero or non-finite variance; check for constant feature columns or var_smoothing = 0")]
    DegenerateVariance { class: u32, feature: usize },
}

/// Configuration could not be loaded or is out of range.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level error for Iris core operations.
#[derive(Error, Debug)]
pub enum IrisError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("classifier returned label {0}, which the artifact's label codec does not define")]
    UndefinedLabel(u32),

    #[error("metrics file not found: {}. Run `iris-train` first", .0.display())]
    MetricsNotFound(PathBuf),
}

/// Result type for Iris core operations
pub type Result<T> = std::result::Result<T, IrisError>;

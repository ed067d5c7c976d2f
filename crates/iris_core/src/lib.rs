//! Iris classifier core
//!
//! Schema resolution, label codec and the model-artifact contract shared by
//! the trainer, the command-line front ends and the web UI. Training and
//! inference both go through the same artifact, so a prediction always uses
//! exactly the feature order and label encoding the model was trained with.

pub mod artifact;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod inference;
pub mod metrics;
pub mod schema;
pub mod serialization;
pub mod telemetry;
pub mod training;

pub use artifact::ModelArtifact;
pub use classifier::{Classifier, GaussianNb, TrainedModel};
pub use codec::LabelCodec;
pub use config::IrisConfig;
pub use dataset::{Dataset, RawTable};
pub use deterministic::{LcgRng, SplitConfig};
pub use errors::{ArtifactError, InputError, InputProblem, IrisError, Result, SchemaError};
pub use inference::{ClassProbability, Prediction, Predictor, RawInput};
pub use metrics::MetricsRecord;
pub use schema::{FeatureColumns, FeatureSlot, FEATURE_COUNT};
pub use training::{train_model_from_csv, IrisTrainer, OutputPaths, SpeciesMapping, TrainingConfig, TrainingOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Training pipeline
//!
//! Raw CSV → validated dataset → seeded hold-out split → fitted classifier →
//! evaluation → model artifact, metrics record and species mapping. Every
//! gate fails before anything is written.

use crate::artifact::ModelArtifact;
use crate::classifier::{Classifier, GaussianNb, TrainedModel};
use crate::codec::LabelCodec;
use crate::dataset::{Dataset, RawTable};
use crate::deterministic::SplitConfig;
use crate::errors::{IrisError, Result};
use crate::metrics::{evaluate, MetricsRecord};
use crate::schema::FeatureColumns;
use crate::serialization::write_canonical_json_file;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Training configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingConfig {
    pub split: SplitConfig,
    pub var_smoothing: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            var_smoothing: GaussianNb::DEFAULT_VAR_SMOOTHING,
        }
    }
}

/// Human-readable record of the label encoding and the frozen feature order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMapping {
    pub species_to_int: BTreeMap<String, u32>,
    pub int_to_species: BTreeMap<u32, String>,
    pub feature_columns: FeatureColumns,
    pub csv_source: String,
    /// Raw name of the detected label column.
    pub label_column: String,
}

impl SpeciesMapping {
    pub fn save(&self, path: &Path) -> Result<()> {
        write_canonical_json_file(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Where a training run writes its outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub model: PathBuf,
    pub metrics: PathBuf,
    pub mapping: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("models/iris_nb.json"),
            metrics: PathBuf::from("models/metrics.json"),
            mapping: PathBuf::from("models/species_mapping.json"),
        }
    }
}

/// Everything one training run produces, not yet persisted.
#[derive(Clone, Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub metrics: MetricsRecord,
    pub mapping: SpeciesMapping,
}

impl TrainingOutcome {
    /// Persist the artifact, then the metrics record, then the mapping.
    ///
    /// Each file is written atomically and independently of the others.
    pub fn save(&self, paths: &OutputPaths) -> Result<()> {
        self.artifact.save(&paths.model)?;
        info!("Saved model artifact to: {}", paths.model.display());

        self.metrics.save(&paths.metrics)?;
        info!("Saved metrics to: {}", paths.metrics.display());

        self.mapping.save(&paths.mapping)?;
        info!("Saved species mapping to: {}", paths.mapping.display());
        Ok(())
    }
}

/// Gaussian Naive Bayes trainer
pub struct IrisTrainer {
    config: TrainingConfig,
    codec: LabelCodec,
}

impl IrisTrainer {
    pub fn new(config: TrainingConfig, codec: LabelCodec) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load, validate and train on a CSV file.
    pub fn train_csv(&self, path: &Path) -> Result<TrainingOutcome> {
        info!("Loading dataset from: {}", path.display());
        let table = RawTable::from_csv(path)?;
        let dataset = Dataset::from_table(&table, &self.codec)?;
        self.train(&dataset, &path.display().to_string())
    }

    /// Split, fit and evaluate on an already validated dataset.
    pub fn train(&self, dataset: &Dataset, csv_source: &str) -> Result<TrainingOutcome> {
        info!(
            "Loaded {} samples; label column '{}'",
            dataset.len(),
            dataset.label_column
        );
        debug!(feature_columns = ?dataset.feature_columns, "resolved feature columns");

        let split = self.config.split.split(dataset.len());
        let (x_train, y_train) = dataset.select(&split.train);
        let (x_test, y_test) = dataset.select(&split.test);
        info!(
            "Split: {} train / {} test (test_size={}, shuffle={}, seed={})",
            split.train.len(),
            split.test.len(),
            self.config.split.test_size,
            self.config.split.shuffle,
            self.config.split.random_state
        );

        let mut model = TrainedModel::from(GaussianNb::with_var_smoothing(self.config.var_smoothing));
        model.fit(&x_train, &y_train)?;

        let y_pred = model.predict(&x_test)?;
        if let Some(undefined) = y_pred.iter().find(|label| self.codec.decode(**label).is_none()) {
            return Err(IrisError::UndefinedLabel(*undefined));
        }

        let evaluation = evaluate(&y_test, &y_pred, &self.codec);
        info!("Test accuracy: {:.4}", evaluation.accuracy);

        let metrics = MetricsRecord::new(
            evaluation,
            &self.codec,
            &dataset.feature_columns,
            &self.config.split,
            model.name(),
            split.train.len(),
            split.test.len(),
        );

        let mapping = SpeciesMapping {
            species_to_int: self.codec.species_to_int().clone(),
            int_to_species: self.codec.int_to_species().clone(),
            feature_columns: dataset.feature_columns.clone(),
            csv_source: csv_source.to_string(),
            label_column: dataset.label_column.clone(),
        };

        let artifact = ModelArtifact::new(model, dataset.feature_columns.clone(), self.codec.clone());

        Ok(TrainingOutcome {
            artifact,
            metrics,
            mapping,
        })
    }
}

/// Train on a CSV and persist every output.
pub fn train_model_from_csv(
    csv: &Path,
    paths: &OutputPaths,
    config: TrainingConfig,
    codec: LabelCodec,
) -> Result<TrainingOutcome> {
    let outcome = IrisTrainer::new(config, codec).train_csv(csv)?;
    outcome.save(paths)?;
    Ok(outcome)
}

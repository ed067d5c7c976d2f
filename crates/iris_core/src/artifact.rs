//! Model artifact: the persisted unit shared by training and inference
//!
//! One canonical JSON document holds the fitted classifier, the frozen
//! feature-column order and both label codec tables, plus a format version
//! and a BLAKE3 checksum over those four fields. Writes are atomic; loads
//! validate every field before handing the artifact out.

use crate::classifier::TrainedModel;
use crate::codec::LabelCodec;
use crate::errors::ArtifactError;
use crate::schema::{FeatureColumns, FEATURE_COUNT};
use crate::serialization::{canonical_hash_hex, canonical_json_string, write_atomic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Current artifact layout version.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Keys every artifact document must carry.
pub const REQUIRED_KEYS: [&str; 6] = [
    "format_version",
    "checksum",
    "model",
    "feature_columns",
    "species_to_int",
    "int_to_species",
];

/// Fields covered by the checksum.
#[derive(Serialize)]
struct Payload<'a> {
    model: &'a TrainedModel,
    feature_columns: &'a FeatureColumns,
    species_to_int: &'a BTreeMap<String, u32>,
    int_to_species: &'a BTreeMap<u32, String>,
}

#[derive(Serialize, Deserialize)]
struct ArtifactDocument {
    format_version: u32,
    checksum: String,
    model: TrainedModel,
    feature_columns: FeatureColumns,
    species_to_int: BTreeMap<String, u32>,
    int_to_species: BTreeMap<u32, String>,
}

/// Immutable bundle of everything needed to reproduce a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    model: TrainedModel,
    feature_columns: FeatureColumns,
    codec: LabelCodec,
}

impl ModelArtifact {
    pub fn new(model: TrainedModel, feature_columns: FeatureColumns, codec: LabelCodec) -> Self {
        Self {
            model,
            feature_columns,
            codec,
        }
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Raw column names in the order the model expects its inputs.
    pub fn feature_columns(&self) -> &FeatureColumns {
        &self.feature_columns
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    fn payload(&self) -> Payload<'_> {
        Payload {
            model: &self.model,
            feature_columns: &self.feature_columns,
            species_to_int: self.codec.species_to_int(),
            int_to_species: self.codec.int_to_species(),
        }
    }

    /// BLAKE3 checksum (hex) of the artifact's canonical payload.
    pub fn checksum(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(&self.payload())
    }

    /// Write all fields as one unit; the target is replaced atomically.
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let write_err = |source: io::Error| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };

        let document = ArtifactDocument {
            format_version: ARTIFACT_FORMAT_VERSION,
            checksum: self.checksum().map_err(|e| write_err(io::Error::other(e)))?,
            model: self.model.clone(),
            feature_columns: self.feature_columns.clone(),
            species_to_int: self.codec.species_to_int().clone(),
            int_to_species: self.codec.int_to_species().clone(),
        };

        let mut json = canonical_json_string(&document).map_err(|e| write_err(io::Error::other(e)))?;
        json.push('\n');
        write_atomic(path, json.as_bytes()).map_err(write_err)?;

        tracing::debug!(path = %path.display(), checksum = %document.checksum, "model artifact written");
        Ok(())
    }

    /// Load and validate an artifact.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let corrupt = |reason: String| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => return Err(corrupt(format!("unreadable: {err}"))),
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| corrupt(format!("invalid JSON: {e}")))?;
        let Some(object) = value.as_object() else {
            return Err(corrupt("document is not a JSON object".to_string()));
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(corrupt(format!("missing required keys: {}", missing.join(", "))));
        }

        let document: ArtifactDocument =
            serde_json::from_value(value).map_err(|e| corrupt(format!("invalid field: {e}")))?;

        if document.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                document.format_version
            )));
        }

        let codec = LabelCodec::from_tables(document.species_to_int, document.int_to_species)
            .map_err(|e| corrupt(format!("inconsistent label codec: {e}")))?;

        document
            .model
            .validate()
            .map_err(|e| corrupt(format!("invalid model: {e}")))?;
        if document.model.n_features() != FEATURE_COUNT {
            return Err(corrupt(format!(
                "model expects {} features, artifact declares {FEATURE_COUNT}",
                document.model.n_features()
            )));
        }

        let artifact = Self::new(document.model, document.feature_columns, codec);
        let actual = artifact
            .checksum()
            .map_err(|e| corrupt(format!("cannot recompute checksum: {e}")))?;
        if actual != document.checksum {
            return Err(corrupt(format!(
                "checksum mismatch (stored {}, computed {actual})",
                document.checksum
            )));
        }

        tracing::debug!(path = %path.display(), checksum = %actual, "model artifact loaded");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, GaussianNb};

    fn fitted_artifact() -> ModelArtifact {
        let features = vec![
            vec![5.1, 3.5, 1.4, 0.2],
            vec![4.9, 3.0, 1.4, 0.2],
            vec![7.0, 3.2, 4.7, 1.4],
            vec![6.4, 3.2, 4.5, 1.5],
            vec![6.3, 3.3, 6.0, 2.5],
            vec![5.8, 2.7, 5.1, 1.9],
        ];
        let labels = vec![1, 1, 2, 2, 3, 3];
        let mut model = GaussianNb::new();
        model.fit(&features, &labels).unwrap();

        ModelArtifact::new(
            model.into(),
            [
                "sepal_length_cm",
                "sepal_width_cm",
                "petal_length_cm",
                "petal_width_cm",
            ]
            .map(String::from),
            LabelCodec::iris(),
        )
    }

    #[test]
    fn save_load_round_trips_exactly() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("models").join("iris_nb.json");
        let artifact = fitted_artifact();

        artifact.save(&path)?;
        let loaded = ModelArtifact::load(&path)?;

        assert_eq!(loaded, artifact);
        assert_eq!(loaded.feature_columns(), artifact.feature_columns());
        assert_eq!(loaded.checksum()?, artifact.checksum()?);
        Ok(())
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
    }

    #[test]
    fn missing_keys_are_all_named() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("iris_nb.json");
        let artifact = fitted_artifact();
        artifact.save(&path)?;

        let mut value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let object = value.as_object_mut().unwrap();
        object.remove("feature_columns");
        object.remove("int_to_species");
        std::fs::write(&path, serde_json::to_string(&value)?)?;

        match ModelArtifact::load(&path) {
            Err(ArtifactError::Corrupt { reason, .. }) => {
                assert!(reason.contains("feature_columns"));
                assert!(reason.contains("int_to_species"));
            }
            other => panic!("expected corrupt artifact, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn tampered_payload_fails_checksum() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("iris_nb.json");
        fitted_artifact().save(&path)?;

        let mut value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        value["feature_columns"][0] = serde_json::json!("sepal_width_cm");
        value["feature_columns"][1] = serde_json::json!("sepal_length_cm");
        std::fs::write(&path, serde_json::to_string(&value)?)?;

        match ModelArtifact::load(&path) {
            Err(ArtifactError::Corrupt { reason, .. }) => assert!(reason.contains("checksum")),
            other => panic!("expected checksum failure, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn garbage_is_corrupt() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("iris_nb.json");
        std::fs::write(&path, "not json at all")?;
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ArtifactError::Corrupt { .. })
        ));
        Ok(())
    }
}

//! Inference pipeline
//!
//! Turns raw user input (positional values, keyed JSON or free-text form
//! fields) into a feature vector in the artifact's frozen column order, runs
//! the classifier and decodes the result through the artifact's own label
//! codec. Every input problem is collected before the classifier is touched.

use crate::artifact::ModelArtifact;
use crate::classifier::Classifier;
use crate::codec::LabelCodec;
use crate::errors::{ArtifactError, ClassifierError, InputError, InputProblem, IrisError, Result};
use crate::schema::{base_feature_key, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Parse a number accepting either `.` or `,` as decimal separator.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Split a `--values` argument into its fields.
///
/// `;` separates fields when present so that `,` stays free for decimals
/// (`"5,1;3,5;1,4;0,2"`); otherwise fields are comma-separated.
pub fn parse_values_arg(text: &str) -> Vec<String> {
    let separator = if text.contains(';') { ';' } else { ',' };
    text.split(separator).map(|part| part.trim().to_string()).collect()
}

/// Raw prediction input as collected by a front end.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// One textual value per feature, in the artifact's column order.
    Positional(Vec<String>),
    /// JSON object keyed by base feature names or raw artifact column names.
    Keyed(Map<String, Value>),
    /// Free-text fields keyed by base feature name.
    Form(BTreeMap<String, String>),
}

impl RawInput {
    pub fn from_values(values: &[f64]) -> Self {
        RawInput::Positional(values.iter().map(|v| v.to_string()).collect())
    }

    /// Input given as a `--values` style string.
    pub fn from_values_arg(text: &str) -> Self {
        RawInput::Positional(parse_values_arg(text))
    }

    /// Interpret a JSON document: an object is keyed input, an array is
    /// positional input.
    pub fn from_json_str(text: &str) -> std::result::Result<Self, InputError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| InputError::single(InputProblem::Malformed(format!("invalid JSON: {e}"))))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> std::result::Result<Self, InputError> {
        match value {
            Value::Object(map) => Ok(RawInput::Keyed(map)),
            Value::Array(items) => Ok(RawInput::Positional(items.iter().map(value_text).collect())),
            other => Err(InputError::single(InputProblem::Malformed(format!(
                "expected a JSON object or array, got {other}"
            )))),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// One class probability, labelled by code and species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: u32,
    pub species: String,
    pub probability: f64,
}

/// Result of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Artifact feature columns, i.e. the order of `input_values`.
    pub input_order: Vec<String>,
    pub input_values: Vec<f64>,
    pub pred_label: u32,
    pub pred_species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<ClassProbability>>,
}

/// Pair a probability row with class labels.
///
/// Uses the classifier's own class order when it exposes one, otherwise the
/// codec's sorted codes.
pub fn decode_probabilities(
    classes: Option<&[u32]>,
    probabilities: &[f64],
    codec: &LabelCodec,
) -> Result<Vec<ClassProbability>> {
    let fallback;
    let order = match classes {
        Some(classes) => classes,
        None => {
            debug!("classifier does not expose its classes; using label codec order");
            fallback = codec.labels();
            &fallback
        }
    };

    order
        .iter()
        .zip(probabilities)
        .map(|(&label, &probability)| {
            let species = codec
                .decode(label)
                .ok_or(IrisError::UndefinedLabel(label))?
                .to_string();
            Ok(ClassProbability {
                label,
                species,
                probability,
            })
        })
        .collect()
}

/// Loaded artifact plus the logic to feed it raw input.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: ModelArtifact,
    /// Base key of each artifact column, in artifact order.
    base_keys: Vec<String>,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact) -> Self {
        let base_keys = artifact
            .feature_columns()
            .iter()
            .map(|column| base_feature_key(column))
            .collect();
        Self {
            artifact,
            base_keys,
        }
    }

    pub fn load(path: &Path) -> std::result::Result<Self, ArtifactError> {
        Ok(Self::new(ModelArtifact::load(path)?))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn feature_columns(&self) -> &[String] {
        self.artifact.feature_columns()
    }

    /// Base keys (`sepal_length`, ...) in artifact order.
    pub fn base_keys(&self) -> &[String] {
        &self.base_keys
    }

    /// Validate and reorder raw input into the artifact's column order.
    pub fn prepare(&self, input: &RawInput) -> std::result::Result<[f64; FEATURE_COUNT], InputError> {
        match input {
            RawInput::Positional(values) => self.prepare_positional(values),
            RawInput::Keyed(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                self.prepare_keyed(|key| map.get(key).cloned(), &keys)
            }
            RawInput::Form(fields) => {
                let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
                self.prepare_keyed(|key| fields.get(key).map(|text| Value::String(text.clone())), &keys)
            }
        }
    }

    fn prepare_positional(&self, values: &[String]) -> std::result::Result<[f64; FEATURE_COUNT], InputError> {
        let mut problems = Vec::new();
        if values.len() != FEATURE_COUNT {
            problems.push(InputProblem::WrongArity {
                expected: FEATURE_COUNT,
                got: values.len(),
            });
        }

        let mut out = [0.0; FEATURE_COUNT];
        for (idx, text) in values.iter().enumerate() {
            let field = self
                .base_keys
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("value {}", idx + 1));
            match parse_number(text) {
                Some(v) if idx < FEATURE_COUNT => out[idx] = v,
                Some(_) => {}
                None => problems.push(InputProblem::InvalidNumber {
                    field,
                    value: text.clone(),
                }),
            }
        }

        if problems.is_empty() {
            Ok(out)
        } else {
            Err(InputError::new(problems))
        }
    }

    /// `keys` lists the supplied keys; ones that are neither a base key nor
    /// an artifact column still match when they fold to the same base key.
    fn prepare_keyed<F>(&self, get: F, keys: &[&str]) -> std::result::Result<[f64; FEATURE_COUNT], InputError>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let mut problems = Vec::new();
        let mut out = [0.0; FEATURE_COUNT];

        let columns = self.artifact.feature_columns();
        for (idx, (column, base)) in columns.iter().zip(&self.base_keys).enumerate() {
            let value = get(base).or_else(|| get(column)).or_else(|| {
                keys.iter()
                    .find(|key| base_feature_key(key) == *base)
                    .and_then(|key| get(key))
            });

            match value {
                None => problems.push(InputProblem::MissingFeature { slot: base.clone() }),
                Some(value) => match value_number(&value) {
                    Some(v) => out[idx] = v,
                    None => problems.push(InputProblem::InvalidNumber {
                        field: base.clone(),
                        value: value_text(&value),
                    }),
                },
            }
        }

        if problems.is_empty() {
            Ok(out)
        } else {
            Err(InputError::new(problems))
        }
    }

    /// Validate, reorder, classify and decode one input.
    pub fn predict(&self, input: &RawInput, with_probabilities: bool) -> Result<Prediction> {
        let values = self.prepare(input)?;
        let row = vec![values.to_vec()];
        let model = self.artifact.model();
        let codec = self.artifact.codec();

        let pred_label = model
            .predict(&row)?
            .first()
            .copied()
            .ok_or(ClassifierError::NotFitted)?;
        let pred_species = codec
            .decode(pred_label)
            .ok_or(IrisError::UndefinedLabel(pred_label))?
            .to_string();

        let probabilities = match (with_probabilities, model.predict_proba(&row)) {
            (true, Some(proba)) => {
                let proba = proba?;
                let first = proba.first().map(Vec::as_slice).unwrap_or_default();
                Some(decode_probabilities(model.classes(), first, codec)?)
            }
            _ => None,
        };

        debug!(label = pred_label, species = %pred_species, "prediction");

        Ok(Prediction {
            input_order: self.artifact.feature_columns().to_vec(),
            input_values: values.to_vec(),
            pred_label,
            pred_species,
            probabilities,
        })
    }
}

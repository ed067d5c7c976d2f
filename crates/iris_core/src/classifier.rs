//! Classifier capability
//!
//! The training and inference pipelines only talk to a classifier through the
//! [`Classifier`] trait: `fit`, `predict`, and optionally `predict_proba` and
//! `classes`. The concrete model shipped in artifacts is a Gaussian Naive
//! Bayes classifier wrapped in the serializable [`TrainedModel`] enum.

use crate::errors::ClassifierError;
use serde::{Deserialize, Serialize};

/// Capability consumed by the pipelines.
pub trait Classifier {
    /// Short model name recorded in the metrics record.
    fn name(&self) -> &'static str;

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), ClassifierError>;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u32>, ClassifierError>;

    /// Per-class probabilities, one row per sample, columns in [`Classifier::classes`]
    /// order. `None` if the model cannot estimate probabilities.
    fn predict_proba(
        &self,
        _features: &[Vec<f64>],
    ) -> Option<Result<Vec<Vec<f64>>, ClassifierError>> {
        None
    }

    /// Internal class ordering, if the model exposes one.
    fn classes(&self) -> Option<&[u32]> {
        None
    }
}

/// Gaussian Naive Bayes classifier.
///
/// Per-class feature likelihoods are independent normals; variances are
/// smoothed by `var_smoothing` times the largest feature variance of the
/// training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    pub var_smoothing: f64,
    /// Sorted unique training labels; column order of `predict_proba`.
    classes: Vec<u32>,
    class_priors: Vec<f64>,
    /// means[class][feature]
    means: Vec<Vec<f64>>,
    /// variances[class][feature], smoothing included
    variances: Vec<Vec<f64>>,
}

impl GaussianNb {
    pub const NAME: &'static str = "GaussianNB";
    pub const DEFAULT_VAR_SMOOTHING: f64 = 1e-9;

    pub fn new() -> Self {
        Self::with_var_smoothing(Self::DEFAULT_VAR_SMOOTHING)
    }

    pub fn with_var_smoothing(var_smoothing: f64) -> Self {
        Self {
            var_smoothing,
            classes: Vec::new(),
            class_priors: Vec::new(),
            means: Vec::new(),
            variances: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.means.first().map_or(0, Vec::len)
    }

    pub fn class_priors(&self) -> &[f64] {
        &self.class_priors
    }

    /// Structural checks for a deserialized model.
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_fitted() {
            return Err("model has not been fitted".to_string());
        }
        let n_classes = self.classes.len();
        if self.class_priors.len() != n_classes
            || self.means.len() != n_classes
            || self.variances.len() != n_classes
        {
            return Err(format!(
                "per-class tables disagree on class count ({n_classes} classes)"
            ));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err("classes are not sorted and unique".to_string());
        }
        let n_features = self.n_features();
        for (means, variances) in self.means.iter().zip(&self.variances) {
            if means.len() != n_features || variances.len() != n_features {
                return Err("per-class tables disagree on feature count".to_string());
            }
            if variances.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err("variances must be finite and positive".to_string());
            }
        }
        if self.class_priors.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
            return Err("class priors must be finite and positive".to_string());
        }
        Ok(())
    }

    fn check_rows(&self, features: &[Vec<f64>]) -> Result<(), ClassifierError> {
        if !self.is_fitted() {
            return Err(ClassifierError::NotFitted);
        }
        let expected = self.n_features();
        match features.iter().find(|row| row.len() != expected) {
            Some(row) => Err(ClassifierError::DimensionMismatch {
                expected,
                got: row.len(),
            }),
            None => Ok(()),
        }
    }

    /// Unnormalized log posterior of each class for one sample.
    fn joint_log_likelihood(&self, row: &[f64]) -> Vec<f64> {
        self.class_priors
            .iter()
            .zip(self.means.iter().zip(&self.variances))
            .map(|(prior, (means, variances))| {
                let mut log_prob = prior.ln();
                for ((x, mean), variance) in row.iter().zip(means).zip(variances) {
                    let diff = x - mean;
                    log_prob -= 0.5 * (2.0 * std::f64::consts::PI * variance).ln();
                    log_prob -= diff * diff / (2.0 * variance);
                }
                log_prob
            })
            .collect()
    }
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GaussianNb {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), ClassifierError> {
        let n_samples = features.len();
        if n_samples == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        if labels.len() != n_samples {
            return Err(ClassifierError::LengthMismatch {
                rows: n_samples,
                labels: labels.len(),
            });
        }
        let n_features = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != n_features) {
            return Err(ClassifierError::DimensionMismatch {
                expected: n_features,
                got: row.len(),
            });
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::TooFewClasses(classes.len()));
        }

        let epsilon = self.var_smoothing * max_feature_variance(features, n_features);

        let mut class_priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for &class in &classes {
            let rows: Vec<&Vec<f64>> = features
                .iter()
                .zip(labels)
                .filter(|(_, &label)| label == class)
                .map(|(row, _)| row)
                .collect();
            let count = rows.len() as f64;
            class_priors.push(count / n_samples as f64);

            let mean: Vec<f64> = (0..n_features)
                .map(|f| rows.iter().map(|row| row[f]).sum::<f64>() / count)
                .collect();
            let variance: Vec<f64> = (0..n_features)
                .map(|f| {
                    let sum_sq: f64 = rows
                        .iter()
                        .map(|row| {
                            let diff = row[f] - mean[f];
                            diff * diff
                        })
                        .sum();
                    sum_sq / count + epsilon
                })
                .collect();
            if let Some(feature) = variance.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(ClassifierError::DegenerateVariance { class, feature });
            }

            means.push(mean);
            variances.push(variance);
        }

        self.classes = classes;
        self.class_priors = class_priors;
        self.means = means;
        self.variances = variances;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u32>, ClassifierError> {
        self.check_rows(features)?;
        Ok(features
            .iter()
            .map(|row| {
                let jll = self.joint_log_likelihood(row);
                // first maximum wins on ties
                let best = jll
                    .iter()
                    .enumerate()
                    .fold(0, |best, (idx, value)| if *value > jll[best] { idx } else { best });
                self.classes[best]
            })
            .collect())
    }

    fn predict_proba(
        &self,
        features: &[Vec<f64>],
    ) -> Option<Result<Vec<Vec<f64>>, ClassifierError>> {
        if let Err(err) = self.check_rows(features) {
            return Some(Err(err));
        }
        Some(Ok(features
            .iter()
            .map(|row| {
                let jll = self.joint_log_likelihood(row);
                let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let exp: Vec<f64> = jll.iter().map(|v| (v - max).exp()).collect();
                let sum: f64 = exp.iter().sum();
                exp.into_iter().map(|p| p / sum).collect()
            })
            .collect()))
    }

    fn classes(&self) -> Option<&[u32]> {
        self.is_fitted().then_some(self.classes.as_slice())
    }
}

/// Largest per-feature population variance over all rows.
fn max_feature_variance(features: &[Vec<f64>], n_features: usize) -> f64 {
    let n = features.len() as f64;
    (0..n_features)
        .map(|f| {
            let mean = features.iter().map(|row| row[f]).sum::<f64>() / n;
            features
                .iter()
                .map(|row| {
                    let diff = row[f] - mean;
                    diff * diff
                })
                .sum::<f64>()
                / n
        })
        .fold(0.0, f64::max)
}

/// Serializable, self-describing fitted model stored inside artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    GaussianNb(GaussianNb),
}

impl TrainedModel {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TrainedModel::GaussianNb(model) => model.validate(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            TrainedModel::GaussianNb(model) => model.n_features(),
        }
    }
}

impl Classifier for TrainedModel {
    fn name(&self) -> &'static str {
        match self {
            TrainedModel::GaussianNb(model) => model.name(),
        }
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), ClassifierError> {
        match self {
            TrainedModel::GaussianNb(model) => model.fit(features, labels),
        }
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u32>, ClassifierError> {
        match self {
            TrainedModel::GaussianNb(model) => model.predict(features),
        }
    }

    fn predict_proba(
        &self,
        features: &[Vec<f64>],
    ) -> Option<Result<Vec<Vec<f64>>, ClassifierError>> {
        match self {
            TrainedModel::GaussianNb(model) => model.predict_proba(features),
        }
    }

    fn classes(&self) -> Option<&[u32]> {
        match self {
            TrainedModel::GaussianNb(model) => model.classes(),
        }
    }
}

impl From<GaussianNb> for TrainedModel {
    fn from(model: GaussianNb) -> Self {
        TrainedModel::GaussianNb(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Vec<Vec<f64>>, Vec<u32>) {
        let features = vec![
            vec![1.0, 1.1],
            vec![1.2, 0.9],
            vec![0.8, 1.0],
            vec![5.0, 5.2],
            vec![5.1, 4.9],
            vec![4.9, 5.0],
        ];
        (features, vec![2, 2, 2, 7, 7, 7])
    }

    #[test]
    fn fits_and_separates_two_blobs() {
        let (x, y) = two_blobs();
        let mut model = GaussianNb::new();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.classes(), Some(&[2, 7][..]));
        assert_eq!(model.predict(&x).unwrap(), y);
        assert_eq!(model.predict(&[vec![0.0, 0.0], vec![6.0, 6.0]]).unwrap(), vec![2, 7]);
    }

    #[test]
    fn probabilities_sum_to_one_in_class_order() {
        let (x, y) = two_blobs();
        let mut model = GaussianNb::new();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&[vec![1.0, 1.0]]).unwrap().unwrap();
        assert_eq!(proba.len(), 1);
        assert!((proba[0].iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(proba[0][0] > 0.99);
    }

    #[test]
    fn priors_follow_class_frequencies() {
        let x = vec![vec![0.0], vec![0.1], vec![0.2], vec![3.0]];
        let y = vec![1, 1, 1, 2];
        let mut model = GaussianNb::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.class_priors(), &[0.75, 0.25]);
    }

    #[test]
    fn unfitted_model_refuses_to_predict() {
        let model = GaussianNb::new();
        assert_eq!(model.predict(&[vec![1.0]]), Err(ClassifierError::NotFitted));
        assert_eq!(model.classes(), None);
        assert!(model.validate().is_err());
    }

    #[test]
    fn rejects_bad_training_input() {
        let mut model = GaussianNb::new();
        assert_eq!(model.fit(&[], &[]), Err(ClassifierError::EmptyTrainingSet));
        assert_eq!(
            model.fit(&[vec![1.0], vec![2.0]], &[1]),
            Err(ClassifierError::LengthMismatch { rows: 2, labels: 1 })
        );
        assert_eq!(
            model.fit(&[vec![1.0], vec![2.0]], &[1, 1]),
            Err(ClassifierError::TooFewClasses(1))
        );
    }

    #[test]
    fn constant_features_cannot_be_fitted() {
        let x = vec![vec![1.0, 1.0]; 4];
        let y = vec![1, 1, 2, 2];
        let mut model = GaussianNb::new();
        assert_eq!(
            model.fit(&x, &y),
            Err(ClassifierError::DegenerateVariance { class: 1, feature: 0 })
        );
        assert!(model.validate().is_err());
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let (x, y) = two_blobs();
        let mut model = GaussianNb::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(
            model.predict(&[vec![1.0, 2.0, 3.0]]),
            Err(ClassifierError::DimensionMismatch { expected: 2, got: 3 })
        );
    }

    #[test]
    fn trained_model_serializes_with_kind_tag() {
        let (x, y) = two_blobs();
        let mut model = GaussianNb::new();
        model.fit(&x, &y).unwrap();
        let wrapped = TrainedModel::from(model);

        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["kind"], "gaussian_nb");

        let back: TrainedModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, wrapped);
        assert_eq!(back.name(), "GaussianNB");
    }
}

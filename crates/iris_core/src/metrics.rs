//! Evaluation metrics and the metrics record
//!
//! The metrics record is a display-only sibling of the model artifact: the
//! inference pipeline never reads it. All per-class tables follow the label
//! codec's integer order, not the order labels happen to appear in the test
//! partition.

use crate::codec::LabelCodec;
use crate::deterministic::SplitConfig;
use crate::errors::{IrisError, Result};
use crate::serialization::write_canonical_json_file;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Precision / recall / F1 / support for one class or one average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class entries keyed by species name plus accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub per_class: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

/// Outcome of scoring predictions against the held-out labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    pub report: ClassificationReport,
    /// rows = true label, cols = predicted label, both in codec order
    pub confusion_matrix: Vec<Vec<usize>>,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Confusion matrix over the given labels; pairs involving any other label
/// are ignored.
pub fn confusion_matrix(y_true: &[u32], y_pred: &[u32], labels: &[u32]) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
    for (t, p) in y_true.iter().zip(y_pred) {
        let row = labels.iter().position(|l| l == t);
        let col = labels.iter().position(|l| l == p);
        if let (Some(row), Some(col)) = (row, col) {
            matrix[row][col] += 1;
        }
    }
    matrix
}

/// Accuracy, classification report and confusion matrix in codec order.
pub fn evaluate(y_true: &[u32], y_pred: &[u32], codec: &LabelCodec) -> Evaluation {
    let labels = codec.labels();
    let matrix = confusion_matrix(y_true, y_pred, &labels);

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    let accuracy = ratio(correct, y_true.len());

    let mut per_class = BTreeMap::new();
    let mut rows = Vec::with_capacity(labels.len());
    for (idx, label) in labels.iter().enumerate() {
        let true_positive = matrix[idx][idx];
        let support: usize = matrix[idx].iter().sum();
        let predicted: usize = matrix.iter().map(|row| row[idx]).sum();

        let precision = ratio(true_positive, predicted);
        let recall = ratio(true_positive, support);
        let metrics = ClassMetrics {
            precision,
            recall,
            f1_score: f1(precision, recall),
            support,
        };
        rows.push(metrics);

        let name = codec.decode(*label).unwrap_or_default().to_string();
        per_class.insert(name, metrics);
    }

    let total_support: usize = rows.iter().map(|m| m.support).sum();
    let n_classes = rows.len().max(1) as f64;
    let macro_avg = ClassMetrics {
        precision: rows.iter().map(|m| m.precision).sum::<f64>() / n_classes,
        recall: rows.iter().map(|m| m.recall).sum::<f64>() / n_classes,
        f1_score: rows.iter().map(|m| m.f1_score).sum::<f64>() / n_classes,
        support: total_support,
    };
    let weighted = |pick: fn(&ClassMetrics) -> f64| {
        if total_support == 0 {
            0.0
        } else {
            rows.iter().map(|m| pick(m) * m.support as f64).sum::<f64>() / total_support as f64
        }
    };
    let weighted_avg = ClassMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1_score: weighted(|m| m.f1_score),
        support: total_support,
    };

    Evaluation {
        accuracy,
        report: ClassificationReport {
            per_class,
            accuracy,
            macro_avg,
            weighted_avg,
        },
        confusion_matrix: matrix,
    }
}

/// Structured metrics document written next to the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Sorted integer codes; row/column labels of the confusion matrix.
    pub labels: Vec<u32>,
    /// Species names in the same order as `labels`.
    pub target_names: Vec<String>,
    pub feature_columns: Vec<String>,
    pub test_size: f64,
    pub shuffle: bool,
    pub random_state: u64,
    pub model: String,
    #[serde(default)]
    pub n_train: usize,
    #[serde(default)]
    pub n_test: usize,
}

impl MetricsRecord {
    pub fn new(
        evaluation: Evaluation,
        codec: &LabelCodec,
        feature_columns: &[String],
        split: &SplitConfig,
        model: &str,
        n_train: usize,
        n_test: usize,
    ) -> Self {
        Self {
            accuracy: evaluation.accuracy,
            classification_report: evaluation.report,
            confusion_matrix: evaluation.confusion_matrix,
            labels: codec.labels(),
            target_names: codec.target_names(),
            feature_columns: feature_columns.to_vec(),
            test_size: split.test_size,
            shuffle: split.shuffle,
            random_state: split.random_state,
            model: model.to_string(),
            n_train,
            n_test,
        }
    }

    /// Write the record as canonical JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_canonical_json_file(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                IrisError::MetricsNotFound(PathBuf::from(path))
            } else {
                IrisError::Io(err)
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Metrics for one species, if present in the report.
    pub fn class_metrics(&self, species: &str) -> Option<&ClassMetrics> {
        self.classification_report.per_class.get(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_matrix_uses_codec_order_not_appearance_order() {
        let codec = LabelCodec::iris();
        let y_true = [3, 3, 1, 2];
        let y_pred = [3, 2, 1, 2];
        let eval = evaluate(&y_true, &y_pred, &codec);

        assert_eq!(
            eval.confusion_matrix,
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 1, 1]]
        );
        assert_eq!(eval.accuracy, 0.75);
    }

    #[test]
    fn row_sums_equal_supports() {
        let codec = LabelCodec::iris();
        let y_true = [1, 1, 2, 2, 2, 3, 3, 3, 3];
        let y_pred = [1, 2, 2, 3, 2, 3, 3, 1, 3];
        let eval = evaluate(&y_true, &y_pred, &codec);

        for (row, name) in eval.confusion_matrix.iter().zip(codec.target_names()) {
            let support = eval.report.per_class[&name].support;
            assert_eq!(row.iter().sum::<usize>(), support);
        }
        assert_eq!(eval.report.macro_avg.support, 9);
    }

    #[test]
    fn precision_recall_and_f1_match_hand_computation() {
        let codec = LabelCodec::iris();
        let y_true = [1, 1, 2, 2];
        let y_pred = [1, 2, 2, 2];
        let eval = evaluate(&y_true, &y_pred, &codec);

        let versicolor = eval.report.per_class["versicolor"];
        assert!((versicolor.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(versicolor.recall, 1.0);
        assert!((versicolor.f1_score - 0.8).abs() < 1e-12);

        // never predicted and never present: zero, not NaN
        let virginica = eval.report.per_class["virginica"];
        assert_eq!(virginica.precision, 0.0);
        assert_eq!(virginica.support, 0);
    }

    #[test]
    fn report_serializes_with_conventional_keys() {
        let codec = LabelCodec::iris();
        let eval = evaluate(&[1, 2, 3], &[1, 2, 3], &codec);
        let json = serde_json::to_value(&eval.report).unwrap();

        assert_eq!(json["accuracy"], 1.0);
        assert_eq!(json["setosa"]["f1-score"], 1.0);
        assert!(json.get("macro avg").is_some());
        assert!(json.get("weighted avg").is_some());

        let back: ClassificationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, eval.report);
    }

    #[test]
    fn missing_metrics_file_has_dedicated_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MetricsRecord::load(&dir.path().join("metrics.json")).unwrap_err();
        assert!(matches!(err, IrisError::MetricsNotFound(_)));
    }
}

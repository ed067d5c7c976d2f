//! End-to-end tests: train on the bundled Iris CSV, persist, reload, predict.

use anyhow::Result;
use iris_core::errors::ArtifactError;
use iris_core::{
    train_model_from_csv, LabelCodec, MetricsRecord, OutputPaths, Predictor, RawInput, SpeciesMapping,
    TrainingConfig,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn iris_csv() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/iris.csv")
}

fn output_paths(dir: &Path) -> OutputPaths {
    OutputPaths {
        model: dir.join("models/iris_nb.json"),
        metrics: dir.join("models/metrics.json"),
        mapping: dir.join("models/species_mapping.json"),
    }
}

fn train_into(dir: &TempDir, csv: &Path) -> Result<OutputPaths> {
    let paths = output_paths(dir.path());
    train_model_from_csv(csv, &paths, TrainingConfig::default(), LabelCodec::iris())?;
    Ok(paths)
}

/// Rewrite the bundled CSV with Kaggle-style headers, an id column and
/// `Iris-` prefixed labels.
fn kaggle_variant(dir: &TempDir) -> Result<PathBuf> {
    let content = std::fs::read_to_string(iris_csv())?;
    let mut out = String::from("Id,SepalLengthCm,SepalWidthCm,PetalLengthCm,PetalWidthCm,Species\n");
    for (idx, line) in content.lines().skip(1).enumerate() {
        let (values, species) = line.rsplit_once(',').expect("label column");
        out.push_str(&format!("{},{values},Iris-{species}\n", idx + 1));
    }
    let path = dir.path().join("Iris.csv");
    std::fs::write(&path, out)?;
    Ok(path)
}

#[test]
fn classic_setosa_sample_predicts_setosa() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = train_into(&dir, &iris_csv())?;

    let predictor = Predictor::load(&paths.model)?;
    let prediction = predictor.predict(&RawInput::from_values(&[5.1, 3.5, 1.4, 0.2]), true)?;

    assert_eq!(prediction.pred_label, 1);
    assert_eq!(prediction.pred_species, "setosa");
    assert_eq!(
        prediction.input_order,
        vec!["sepal_length", "sepal_width", "petal_length", "petal_width"]
    );

    let probabilities = prediction.probabilities.expect("GaussianNB exposes probabilities");
    assert_eq!(probabilities[0].species, "setosa");
    assert!(probabilities[0].probability > 0.99);
    Ok(())
}

#[test]
fn default_split_holds_out_thirty_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = train_into(&dir, &iris_csv())?;
    let metrics = MetricsRecord::load(&paths.metrics)?;

    assert_eq!(metrics.n_test, 30);
    assert_eq!(metrics.n_train, 120);
    assert_eq!(metrics.test_size, 0.2);
    assert!(metrics.shuffle);
    assert_eq!(metrics.random_state, 42);
    assert_eq!(metrics.labels, vec![1, 2, 3]);
    assert_eq!(metrics.target_names, vec!["setosa", "versicolor", "virginica"]);
    assert!(metrics.accuracy >= 0.9, "accuracy {}", metrics.accuracy);

    let mut total = 0;
    for (row, name) in metrics.confusion_matrix.iter().zip(&metrics.target_names) {
        let support = metrics.class_metrics(name).expect("class entry").support;
        assert_eq!(row.iter().sum::<usize>(), support);
        total += support;
    }
    assert_eq!(total, 30);
    Ok(())
}

#[test]
fn retraining_reproduces_artifact_and_metrics() -> Result<()> {
    let first_dir = tempfile::tempdir()?;
    let second_dir = tempfile::tempdir()?;
    let first = train_into(&first_dir, &iris_csv())?;
    let second = train_into(&second_dir, &iris_csv())?;

    assert_eq!(std::fs::read(&first.model)?, std::fs::read(&second.model)?);

    let m1 = MetricsRecord::load(&first.metrics)?;
    let m2 = MetricsRecord::load(&second.metrics)?;
    assert_eq!(m1.feature_columns, m2.feature_columns);
    assert_eq!(m1.accuracy, m2.accuracy);
    assert_eq!(m1.confusion_matrix, m2.confusion_matrix);
    Ok(())
}

#[test]
fn kaggle_headers_are_frozen_verbatim() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = kaggle_variant(&dir)?;
    let paths = train_into(&dir, &csv)?;

    let mapping = SpeciesMapping::load(&paths.mapping)?;
    assert_eq!(mapping.label_column, "Species");
    assert_eq!(
        mapping.feature_columns,
        ["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm"].map(String::from)
    );

    let predictor = Predictor::load(&paths.model)?;
    assert_eq!(
        predictor.base_keys(),
        ["sepal_length", "sepal_width", "petal_length", "petal_width"]
    );

    let keyed = RawInput::from_json_str(
        r#"{"petal_width": "2,5", "sepal_width": 3.3, "petal_length": 6.0, "sepal_length": 6.3}"#,
    )?;
    let prediction = predictor.predict(&keyed, false)?;
    assert_eq!(prediction.input_values, vec![6.3, 3.3, 6.0, 2.5]);
    assert_eq!(prediction.pred_species, "virginica");
    assert_eq!(prediction.pred_label, 3);
    Ok(())
}

#[test]
fn truncated_artifact_is_reported_as_corrupt() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = train_into(&dir, &iris_csv())?;

    let bytes = std::fs::read(&paths.model)?;
    std::fs::write(&paths.model, &bytes[..bytes.len() / 2])?;

    match Predictor::load(&paths.model) {
        Err(ArtifactError::Corrupt { .. }) => Ok(()),
        other => panic!("expected corrupt artifact, got {other:?}"),
    }
}

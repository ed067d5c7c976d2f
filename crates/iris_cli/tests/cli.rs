//! Runs the `iris-cli` binary against a freshly trained artifact.

use anyhow::Result;
use iris_core::{train_model_from_csv, LabelCodec, OutputPaths, TrainingConfig};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn trained(dir: &TempDir) -> Result<OutputPaths> {
    let csv = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/iris.csv");
    let paths = OutputPaths {
        model: dir.path().join("models/iris_nb.json"),
        metrics: dir.path().join("models/metrics.json"),
        mapping: dir.path().join("models/species_mapping.json"),
    };
    train_model_from_csv(&csv, &paths, TrainingConfig::default(), LabelCodec::iris())?;
    Ok(paths)
}

fn iris_cli(dir: &TempDir, model: &Path, metrics: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_iris-cli"))
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--model")
        .arg(model)
        .arg("--metrics")
        .arg(metrics)
        .args(args)
        .output()?)
}

fn stdout_json(output: &Output) -> Result<serde_json::Value> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn predict_values_prints_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(&dir, &paths.model, &paths.metrics, &["predict", "--values", "5.1,3.5,1.4,0.2"])?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output)?;
    assert_eq!(json["pred_label"], 1);
    assert_eq!(json["pred_species"], "setosa");
    assert_eq!(json["input_values"], serde_json::json!([5.1, 3.5, 1.4, 0.2]));
    assert!(json.get("probabilities").is_none());
    Ok(())
}

#[test]
fn verbose_flag_logs_artifact_load_to_stderr() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(&dir, &paths.model, &paths.metrics, &["-v", "predict", "--values", "5.1,3.5,1.4,0.2"])?;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Loaded model artifact from"));
    assert_eq!(stdout_json(&output)?["pred_species"], "setosa");
    Ok(())
}

#[test]
fn predict_semicolon_values_accept_decimal_commas() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(
        &dir,
        &paths.model,
        &paths.metrics,
        &["predict", "--values", "6,3;3,3;6,0;2,5", "--probs"],
    )?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["pred_species"], "virginica");
    let probabilities = json["probabilities"].as_array().expect("probabilities");
    assert_eq!(probabilities.len(), 3);
    assert_eq!(probabilities[2]["species"], "virginica");
    Ok(())
}

#[test]
fn predict_json_reports_every_bad_field() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(
        &dir,
        &paths.model,
        &paths.metrics,
        &["predict", "--json", r#"{"sepal_length": "abc", "sepal_width": 3.5, "petal_length": "x"}"#],
    )?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sepal_length: invalid number 'abc'"));
    assert!(stderr.contains("petal_length: invalid number 'x'"));
    assert!(stderr.contains("missing feature petal_width"));
    Ok(())
}

#[test]
fn missing_model_tells_user_to_train() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let absent = PathBuf::from("nowhere/iris_nb.json");

    let output = iris_cli(&dir, &absent, Path::new("nowhere/metrics.json"), &["predict", "--values", "1,2,3,4"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("iris-train"));
    Ok(())
}

#[test]
fn pretty_renders_tables_and_final_json() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(&dir, &paths.model, &paths.metrics, &["pretty", "--values", "5.1,3.5,1.4,0.2"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SETOSA"));
    assert!(stdout.contains("Probability per class"));
    assert!(stdout.contains("\"pred_species\": \"setosa\""));

    let no_probs = iris_cli(
        &dir,
        &paths.model,
        &paths.metrics,
        &["pretty", "--values", "5.1,3.5,1.4,0.2", "--no-probs"],
    )?;
    assert!(!String::from_utf8_lossy(&no_probs.stdout).contains("Probability per class"));
    Ok(())
}

#[test]
fn report_shows_accuracy_and_confusion_matrix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = trained(&dir)?;

    let output = iris_cli(&dir, &paths.model, &paths.metrics, &["report"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy (test)"));
    assert!(stdout.contains("GaussianNB"));
    assert!(stdout.contains("macro avg"));
    assert!(stdout.contains("Confusion matrix"));
    Ok(())
}

#[test]
fn report_without_metrics_is_a_clear_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = iris_cli(
        &dir,
        Path::new("models/iris_nb.json"),
        Path::new("models/metrics.json"),
        &["report"],
    )?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("metrics file not found"));
    Ok(())
}

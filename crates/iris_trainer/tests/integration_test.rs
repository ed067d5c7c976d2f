//! Integration tests for the trainer binary
//!
//! Runs `iris-train` end to end and checks the files it leaves behind.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn iris_csv() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/iris.csv")
}

fn run_trainer(dir: &TempDir, csv: &Path, extra: &[&str]) -> Result<Output> {
    let out = dir.path().join("models");
    let output = Command::new(env!("CARGO_BIN_EXE_iris-train"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("--csv")
        .arg(csv)
        .arg("--model-out")
        .arg(out.join("iris_nb.json"))
        .arg("--metrics-out")
        .arg(out.join("metrics.json"))
        .arg("--mapping-out")
        .arg(out.join("species_mapping.json"))
        .args(extra)
        .output()?;
    Ok(output)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

#[test]
fn test_training_writes_all_outputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_trainer(&dir, &iris_csv(), &[])?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let models = dir.path().join("models");
    let artifact = read_json(&models.join("iris_nb.json"))?;
    assert_eq!(artifact["format_version"], 1);
    assert_eq!(artifact["model"]["kind"], "gaussian_nb");
    assert_eq!(artifact["species_to_int"]["setosa"], 1);
    assert_eq!(artifact["int_to_species"]["3"], "virginica");

    let metrics = read_json(&models.join("metrics.json"))?;
    assert_eq!(metrics["n_test"], 30);
    assert_eq!(metrics["model"], "GaussianNB");
    assert!(metrics["classification_report"]["macro avg"].is_object());

    let mapping = read_json(&models.join("species_mapping.json"))?;
    assert_eq!(mapping["label_column"], "species");

    let log = String::from_utf8_lossy(&output.stderr);
    assert!(log.contains("Accuracy (test)"));
    assert!(log.contains("Confusion matrix"));
    Ok(())
}

#[test]
fn test_deterministic_training() -> Result<()> {
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    assert!(run_trainer(&first, &iris_csv(), &["--seed", "7"])?.status.success());
    assert!(run_trainer(&second, &iris_csv(), &["--seed", "7"])?.status.success());

    let a = std::fs::read(first.path().join("models/iris_nb.json"))?;
    let b = std::fs::read(second.path().join("models/iris_nb.json"))?;
    assert_eq!(a, b, "artifacts should be byte-identical");

    let metrics = read_json(&first.path().join("models/metrics.json"))?;
    assert_eq!(metrics["random_state"], 7);
    Ok(())
}

#[test]
fn test_missing_feature_column_fails_without_artifact() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("broken.csv");
    std::fs::write(
        &csv,
        "sepal_length,sepal_width,petal_length,species\n5.1,3.5,1.4,setosa\n7.0,3.2,4.7,versicolor\n",
    )?;

    let output = run_trainer(&dir, &csv, &[])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("petal_width"));
    assert!(!dir.path().join("models/iris_nb.json").exists());
    Ok(())
}

#[test]
fn test_unknown_labels_are_listed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("labels.csv");
    std::fs::write(
        &csv,
        "sepal_length,sepal_width,petal_length,petal_width,species\n\
         5.1,3.5,1.4,0.2,setosa\n\
         6.0,3.0,4.0,1.3,Iris-rosea\n\
         6.1,3.1,4.1,1.4,daisy\n",
    )?;

    let output = run_trainer(&dir, &csv, &[])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("daisy"));
    assert!(stderr.contains("rosea"));
    Ok(())
}

#[test]
fn test_print_config_reflects_overrides() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = run_trainer(&dir, &iris_csv(), &["--test-size", "0.25", "--no-shuffle", "--print-config"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test_size = 0.25"));
    assert!(stdout.contains("shuffle = false"));
    assert!(!dir.path().join("models").exists());
    Ok(())
}

//! Output formatting utilities

use colored::Colorize;
use iris_core::metrics::{ClassMetrics, MetricsRecord};
use iris_core::Prediction;
use std::path::Path;

const PANEL_WIDTH: usize = 52;

/// Print a section header
pub(crate) fn section(title: &str) {
    println!("\n{}", format!("=== {title} ===").cyan().bold());
}

/// Print a key-value pair
pub(crate) fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

/// Print an error message
pub(crate) fn error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

/// Box plain lines; padding is computed before coloring so escape codes do
/// not skew the borders.
fn panel_lines(title: &str, lines: &[String]) -> Vec<String> {
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0)
        .max(PANEL_WIDTH);

    let title_pad = inner - title.chars().count() - 2;
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("╭─ {title} {}╮", "─".repeat(title_pad.saturating_sub(1))));
    for line in lines {
        let pad = inner - line.chars().count();
        out.push(format!("│{}{}│", line, " ".repeat(pad)));
    }
    out.push(format!("╰{}╯", "─".repeat(inner)));
    out
}

fn print_panel(title: &str, lines: &[String], color: fn(String) -> colored::ColoredString) {
    for line in panel_lines(title, lines) {
        println!("{}", color(line));
    }
}

/// Fixed-width text bar for a probability in [0, 1].
pub(crate) fn probability_bar(probability: f64, width: usize) -> String {
    let filled = (probability.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub(crate) fn banner() {
    print_panel(
        "Iris Classifier",
        &[
            " Friendly command-line interface".to_string(),
            " Type 4 values or use --values / --json.".to_string(),
        ],
        |s| s.blue(),
    );
}

/// Result panel, inputs table, probability table and the JSON result.
pub(crate) fn render_prediction(prediction: &Prediction) {
    println!();
    print_panel(
        "Iris Result",
        &[
            String::new(),
            format!(
                " Prediction: {}  (label = {})",
                prediction.pred_species.to_uppercase(),
                prediction.pred_label
            ),
            String::new(),
        ],
        |s| s.green().bold(),
    );

    section("Input (model order)");
    let key_width = prediction
        .input_order
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(7)
        .max(7);
    println!("  {:<key_width$}  {}", "Feature".bold(), "Value".bold());
    for (column, value) in prediction.input_order.iter().zip(&prediction.input_values) {
        println!("  {:<key_width$}  {}", column.cyan(), value);
    }

    if let Some(probabilities) = &prediction.probabilities {
        section("Probability per class");
        println!(
            "  {:<6} {:<12} {:>11}",
            "Class".magenta().bold(),
            "Species".magenta().bold(),
            "Probability".magenta().bold()
        );
        for p in probabilities {
            let line = format!(
                "  {:<6} {:<12} {:>11.4}  {}",
                p.label,
                p.species,
                p.probability,
                probability_bar(p.probability, 20)
            );
            if p.label == prediction.pred_label {
                println!("{}", line.magenta().bold());
            } else {
                println!("{}", line.magenta());
            }
        }
    }

    section("JSON output");
    let text = serde_json::to_string_pretty(prediction).unwrap_or_default();
    println!("{}", text.cyan());
}

fn metrics_row(label: &str, m: &ClassMetrics) -> String {
    format!(
        "  {:<14} {:>9.4} {:>9.4} {:>9.4} {:>8}",
        label, m.precision, m.recall, m.f1_score, m.support
    )
}

/// Summary, per-class table, averages and confusion matrix.
pub(crate) fn render_report(metrics: &MetricsRecord, path: &Path) {
    section("Training report");
    kv("Metrics file", path.display());
    kv("Model", &metrics.model);
    kv("Accuracy (test)", format!("{:.4}", metrics.accuracy).green().bold());
    kv(
        "Split",
        format!(
            "test_size={} | shuffle={} | random_state={}",
            metrics.test_size, metrics.shuffle, metrics.random_state
        ),
    );
    if metrics.n_train + metrics.n_test > 0 {
        kv("Rows", format!("{} train / {} test", metrics.n_train, metrics.n_test));
    }
    kv("Feature order", metrics.feature_columns.join(", "));

    section("Per-class metrics");
    println!(
        "{}",
        format!(
            "  {:<14} {:>9} {:>9} {:>9} {:>8}",
            "class", "precision", "recall", "f1-score", "support"
        )
        .bold()
    );
    for name in &metrics.target_names {
        if let Some(m) = metrics.class_metrics(name) {
            println!("{}", metrics_row(name, m));
        }
    }
    let report = &metrics.classification_report;
    println!("{}", metrics_row("macro avg", &report.macro_avg).dimmed());
    println!("{}", metrics_row("weighted avg", &report.weighted_avg).dimmed());

    section("Confusion matrix (rows = true, cols = predicted)");
    let width = metrics
        .target_names
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(4);
    let header: String = metrics
        .target_names
        .iter()
        .map(|n| format!(" {n:>width$}"))
        .collect();
    println!("  {:<width$}{}", "", header.bold());
    for (name, row) in metrics.target_names.iter().zip(&metrics.confusion_matrix) {
        let cells: String = row.iter().map(|c| format!(" {c:>width$}")).collect();
        println!("  {:<width$}{}", name.cyan(), cells);
    }
}

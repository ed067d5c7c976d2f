//! Server-rendered HTML for the prediction form

use crate::AppState;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use iris_core::{FeatureSlot, IrisError, Prediction};
use std::collections::BTreeMap;
use std::fmt::Write;

const STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            margin: 0;
            background: #f5f5f5;
            color: #333;
        }
        .layout {
            display: flex;
            gap: 24px;
            max-width: 1100px;
            margin: 30px auto;
            padding: 0 20px;
        }
        aside {
            width: 300px;
            background: white;
            padding: 20px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        main {
            flex: 1;
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            border-bottom: 3px solid #c2185b;
            padding-bottom: 10px;
        }
        .caption { color: #666; font-size: 0.9em; }
        .metric { font-size: 2em; font-weight: bold; color: #2e7d32; }
        pre, code {
            background: #f4f4f4;
            padding: 2px 6px;
            border-radius: 3px;
        }
        pre { padding: 10px; overflow-x: auto; }
        .grid {
            display: grid;
            grid-template-columns: 1fr 1fr;
            gap: 12px 24px;
            margin: 16px 0;
        }
        label { display: block; font-weight: bold; margin-bottom: 4px; }
        input[type=text] { width: 100%; padding: 8px; box-sizing: border-box; }
        button {
            background: #c2185b;
            color: white;
            border: none;
            padding: 10px 20px;
            border-radius: 4px;
            cursor: pointer;
        }
        .success {
            background: #e8f5e9;
            border-left: 4px solid #2e7d32;
            padding: 12px;
            margin: 16px 0;
        }
        .error {
            background: #ffebee;
            border-left: 4px solid #c62828;
            padding: 12px;
            margin: 16px 0;
        }
        table { border-collapse: collapse; margin: 12px 0; }
        td, th { border: 1px solid #ddd; padding: 6px 12px; text-align: left; }
        .bar-track { background: #eee; width: 240px; height: 14px; border-radius: 3px; }
        .bar { background: #c2185b; height: 14px; border-radius: 3px; }
        footer { margin-top: 30px; color: #666; font-size: 0.85em; }
"#;

/// Escape text for inclusion in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Values shown in an untouched form, close to a typical setosa.
pub(crate) fn default_fields() -> BTreeMap<String, String> {
    FeatureSlot::ALL
        .into_iter()
        .zip(["5.1", "3.5", "1.4", "0.2"])
        .map(|(slot, value)| (slot.base_name().to_string(), value.to_string()))
        .collect()
}

fn sidebar(state: &AppState, out: &mut String) {
    let artifact = state.predictor().artifact();
    out.push_str("<aside>\n<h2>About the model</h2>\n");
    out.push_str("<p><strong>Algorithm:</strong> Gaussian Naive Bayes</p>\n");

    if let Some(metrics) = state.metrics() {
        let _ = write!(
            out,
            "<p>Accuracy (test)</p><div class=\"metric\">{:.4}</div>\n\
             <p class=\"caption\">Split: test_size={} | shuffle={} | random_state={}</p>\n",
            metrics.accuracy, metrics.test_size, metrics.shuffle, metrics.random_state
        );
    }

    let _ = write!(
        out,
        "<p><strong>Feature order in the model:</strong></p>\n<pre>{}</pre>\n",
        escape_html(&artifact.feature_columns().join(", "))
    );

    let label_map = serde_json::to_string_pretty(artifact.codec().species_to_int()).unwrap_or_default();
    let _ = write!(
        out,
        "<p><strong>Label map:</strong></p>\n<pre>{}</pre>\n",
        escape_html(&label_map)
    );

    let _ = write!(
        out,
        "<p><strong>Paths:</strong></p>\n<pre>{}</pre>\n<pre>{}</pre>\n</aside>\n",
        escape_html(&state.model_path.display().to_string()),
        escape_html(&state.metrics_path.display().to_string())
    );
}

fn form(fields: &BTreeMap<String, String>, out: &mut String) {
    out.push_str("<form method=\"post\" action=\"/predict\">\n");
    out.push_str("<p>Type the values (a point or a comma both work as decimal separator):</p>\n");
    out.push_str("<div class=\"grid\">\n");
    for slot in FeatureSlot::ALL {
        let name = slot.base_name();
        let value = fields.get(name).map(String::as_str).unwrap_or("");
        let _ = writeln!(
            out,
            "<div><label for=\"{name}\">{}</label>\
             <input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{}\"></div>",
            slot.display_name(),
            escape_html(value)
        );
    }
    out.push_str("</div>\n<button type=\"submit\">Predict</button>\n</form>\n");
}

fn result(prediction: &Prediction, out: &mut String) {
    let _ = writeln!(
        out,
        "<div class=\"success\"><strong>Prediction:</strong> {} (label = {})</div>",
        escape_html(&prediction.pred_species.to_uppercase()),
        prediction.pred_label
    );

    out.push_str("<h3>Inputs used for the prediction</h3>\n<table>\n<tr>");
    for column in &prediction.input_order {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr>\n<tr>");
    for value in &prediction.input_values {
        let _ = write!(out, "<td>{value}</td>");
    }
    out.push_str("</tr>\n</table>\n");

    if let Some(probabilities) = &prediction.probabilities {
        out.push_str("<h3>Probability per class</h3>\n<table>\n");
        out.push_str("<tr><th>Species</th><th>Probability</th><th></th></tr>\n");
        for p in probabilities {
            let width = (p.probability.clamp(0.0, 1.0) * 100.0).round();
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{:.4}</td>\
                 <td><div class=\"bar-track\"><div class=\"bar\" style=\"width: {width}%\"></div></div></td></tr>",
                escape_html(&p.species),
                p.probability
            );
        }
        out.push_str("</table>\n");
    }

    let json = serde_json::to_string_pretty(prediction).unwrap_or_default();
    let _ = writeln!(
        out,
        "<p><a download=\"iris_prediction.json\" href=\"data:application/json;base64,{}\">\
         Download result (JSON)</a></p>",
        STANDARD.encode(json.as_bytes())
    );
}

fn errors(err: &IrisError, out: &mut String) {
    out.push_str("<div class=\"error\"><strong>Input errors:</strong>\n<ul>\n");
    match err {
        IrisError::Input(input) => {
            for problem in &input.problems {
                let _ = writeln!(out, "<li>{}</li>", escape_html(&problem.to_string()));
            }
        }
        other => {
            let _ = writeln!(out, "<li>{}</li>", escape_html(&other.to_string()));
        }
    }
    out.push_str("</ul>\n</div>\n");
}

/// Full page: sidebar, form (prefilled with `fields`) and, after a
/// submission, either the result or every input error.
pub(crate) fn render_page(
    state: &AppState,
    fields: &BTreeMap<String, String>,
    outcome: Option<&Result<Prediction, IrisError>>,
) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Iris Classifier</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"layout\">\n"
    );

    sidebar(state, &mut out);

    out.push_str("<main>\n<h1>Iris Classifier</h1>\n");
    out.push_str("<p class=\"caption\">Web interface for prediction (Gaussian Naive Bayes)</p>\n");
    form(fields, &mut out);

    match outcome {
        Some(Ok(prediction)) => result(prediction, &mut out),
        Some(Err(err)) => errors(err, &mut out),
        None => {}
    }

    out.push_str(
        "<footer>Quick hint: <em>petal_length</em> &lt; ~2.5 means setosa; 3 to 5 \
         (with <em>petal_width</em> &le; ~1.8) means versicolor; above ~5 or \
         <em>petal_width</em> &gt; ~1.8 means virginica.</footer>\n",
    );
    out.push_str("</main>\n</div>\n</body>\n</html>\n");
    out
}

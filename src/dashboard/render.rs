//! HTML rendering for the dashboard tabs

use crate::assets::{ClusterProfile, SupportingAssets};
use crate::config::ZeroPolicy;
use crate::dashboard::form::FORM_FIELDS;
use crate::dataset::DatasetSummary;
use crate::error::{PredictError, SupportingAssetMissing};
use crate::feature_assembler::CLINICAL_ZERO_FIELDS;
use crate::types::patient::FEATURE_COLUMNS;
use crate::types::prediction::{RiskAssessment, RiskLevel};
use std::fmt::Write;

/// Dashboard tabs, in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Predict,
    Eda,
    Clusters,
    Report,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Predict, Tab::Eda, Tab::Clusters, Tab::Report];

    fn href(&self) -> &'static str {
        match self {
            Tab::Predict => "/predict",
            Tab::Eda => "/eda",
            Tab::Clusters => "/clusters",
            Tab::Report => "/report",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Tab::Predict => "Risk prediction",
            Tab::Eda => "Exploratory analysis",
            Tab::Clusters => "Clusters",
            Tab::Report => "Model evaluation",
        }
    }
}

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;color:#222}\
nav a{margin-right:1em}nav a.active{font-weight:bold}\
.warning{background:#fff4d6;border-left:4px solid #e0a800;padding:.6em 1em;margin:.6em 0}\
.error{background:#fde2e1;border-left:4px solid #c0392b;padding:.6em 1em;margin:.6em 0}\
.success{background:#e3f6e8;border-left:4px solid #27ae60;padding:.6em 1em;margin:.6em 0}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.3em .6em;text-align:right}\
label{display:block;margin-top:.5em}pre{background:#f6f6f6;padding:1em}img{max-width:100%}";

/// Escape text for inclusion in HTML content or attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Full page with navigation and the artifact warning banner
pub fn page(active: Tab, diagnostics: &[String], body: &str) -> String {
    let mut nav = String::new();
    for tab in Tab::ALL {
        let class = if tab == active { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{}\"{}>{}</a>", tab.href(), class, tab.title());
    }

    let mut banner = String::new();
    for diagnostic in diagnostics {
        let _ = write!(banner, "<div class=\"warning\">{}</div>", escape(diagnostic));
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
<title>Diabetes risk - {title}</title><style>{STYLE}</style></head>\
<body><h1>Diabetes risk prediction</h1><nav>{nav}</nav>{banner}<h2>{title}</h2>{body}</body></html>",
        title = active.title(),
    )
}

fn warning(text: &str) -> String {
    format!("<div class=\"warning\">{}</div>", escape(text))
}

fn missing_asset(missing: &SupportingAssetMissing) -> String {
    warning(&missing.to_string())
}

/// Prediction form, pre-filled with `values` (zero when untouched)
pub fn prediction_form(values: &[Option<&str>; 8], zero_policy: ZeroPolicy) -> String {
    let mut out = String::from("<p>Enter the patient's measurements to estimate the risk of diabetes.</p>");
    out.push_str("<form method=\"post\" action=\"/predict\">");
    for ((name, label, step), value) in FORM_FIELDS.iter().zip(values) {
        let _ = write!(
            out,
            "<label for=\"{name}\">{label}</label>\
<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"0\" step=\"{step}\" value=\"{}\">",
            escape(value.unwrap_or("0"))
        );
    }
    out.push_str("<p><button type=\"submit\">Predict diabetes risk</button></p></form>");

    if zero_policy == ZeroPolicy::Reject {
        let _ = write!(
            out,
            "<p><small>Zero readings are treated as missing for: {}.</small></p>",
            CLINICAL_ZERO_FIELDS.join(", ")
        );
    }
    out
}

/// Result panel for a scored submission
pub fn assessment(assessment: &RiskAssessment) -> String {
    let class = match assessment.risk_level {
        RiskLevel::Low => "success",
        RiskLevel::Elevated => "error",
    };
    format!(
        "<div class=\"{class}\"><strong>{}</strong></div>",
        escape(&assessment.message())
    )
}

/// Panel for a submission that could not be scored
pub fn predict_error(error: &PredictError) -> String {
    match error {
        PredictError::Unavailable { .. } => warning(
            "Model or scaler not loaded; prediction is unavailable. Check the artifact files.",
        ),
        PredictError::Validation(e) => warning(&format!("Invalid input: {e}")),
        PredictError::Inference(e) => format!(
            "<div class=\"error\">Prediction failed: {}</div>",
            escape(&e.to_string())
        ),
    }
}

/// Exploratory analysis tab
pub fn eda(summary: Option<&DatasetSummary>, assets: &SupportingAssets) -> String {
    let mut out = String::new();

    match summary {
        Some(summary) => {
            let _ = write!(
                out,
                "<p>{} patients, {} with diabetes ({:.1}%), {} without.</p>",
                summary.rows,
                summary.positives,
                summary.positive_rate() * 100.0,
                summary.negatives
            );

            out.push_str(
                "<table><tr><th>Column</th><th>Count</th><th>Mean</th><th>Std</th>\
<th>Min</th><th>Median</th><th>Max</th><th>Zeros</th></tr>",
            );
            for c in &summary.columns {
                let _ = write!(
                    out,
                    "<tr><th>{}</th><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td>\
<td>{:.2}</td><td>{:.2}</td><td>{}</td></tr>",
                    c.name, c.count, c.mean, c.std, c.min, c.median, c.max, c.zeros
                );
            }
            out.push_str("</table>");

            out.push_str("<h3>Mean by outcome</h3><table><tr><th>Column</th><th>Outcome 0</th><th>Outcome 1</th></tr>");
            for (idx, name) in FEATURE_COLUMNS.iter().enumerate() {
                let cell = |means: &Option<[f64; 8]>| {
                    means.map_or_else(|| "-".to_string(), |m| format!("{:.2}", m[idx]))
                };
                let _ = write!(
                    out,
                    "<tr><th>{name}</th><td>{}</td><td>{}</td></tr>",
                    cell(&summary.mean_by_outcome[0]),
                    cell(&summary.mean_by_outcome[1])
                );
            }
            out.push_str("</table>");
        }
        None => out.push_str(&warning("Reference dataset not loaded; statistics unavailable.")),
    }

    for chart in assets.eda_charts() {
        match chart {
            Ok(name) => {
                let _ = write!(
                    out,
                    "<figure><img src=\"/assets/{0}\" alt=\"{0}\"></figure>",
                    escape(name)
                );
            }
            Err(missing) => out.push_str(&missing_asset(&missing)),
        }
    }
    out
}

/// Clustering tab
pub fn clusters(assets: &SupportingAssets) -> String {
    let mut out = String::new();

    match assets.cluster_image() {
        Ok(name) => {
            let _ = write!(
                out,
                "<figure><img src=\"/assets/{0}\" alt=\"Patient clusters\"></figure>",
                escape(name)
            );
        }
        Err(missing) => out.push_str(&missing_asset(&missing)),
    }

    match &assets.cluster_summary {
        Ok(rows) => out.push_str(&cluster_table(rows)),
        Err(missing) => out.push_str(&missing_asset(missing)),
    }
    out
}

fn cluster_table(rows: &[ClusterProfile]) -> String {
    let mut out = String::from(
        "<table><tr><th>Cluster</th><th>Diabetes rate</th><th>Glucose</th>\
<th>BMI</th><th>Age</th><th>Insulin</th></tr>",
    );
    for row in rows {
        let _ = write!(
            out,
            "<tr><th>{}</th><td>{:.1}%</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td></tr>",
            row.cluster,
            row.diabetes_rate * 100.0,
            row.glucose,
            row.bmi,
            row.age,
            row.insulin
        );
    }
    out.push_str("</table>");
    out
}

/// Model evaluation tab
pub fn report(assets: &SupportingAssets) -> String {
    match &assets.evaluation_report {
        Ok(text) => format!("<pre>{}</pre>", escape(text)),
        Err(missing) => missing_asset(missing),
    }
}

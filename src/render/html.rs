//! Self-contained HTML report for one batch run. No scripts, no external
//! stylesheets; charts are plain CSS bars.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::escape_html;
use crate::error::Result;
use crate::view::{
    fmt_number, BatchView, CaseDetail, Outcome, QualityBar, SuccessChart, SummaryView, Tone,
    GROUND_TRUTH_DETAILS, OVERLAP_PASS_THRESHOLD,
};

const REPORT_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Cascadia Code','Fira Code',monospace;padding:24px;line-height:1.5}
h1{font-size:1.2rem;color:#58a6ff;margin-bottom:4px}
h2{font-size:.85rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px;margin:20px 0 10px}
.meta{font-size:.75rem;color:#8b949e}
.metrics-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(150px,1fr));gap:10px}
.metric-card{background:#161b22;border:1px solid #30363d;border-radius:6px;padding:12px;text-align:center}
.metric-value{font-size:1.3rem;font-weight:700}
.metric-label{font-size:.7rem;color:#8b949e;text-transform:uppercase}
.tone-success{color:#3fb950}.tone-info{color:#39c5cf}.tone-primary{color:#58a6ff}
.tone-warning{color:#d29922}.tone-danger{color:#f85149}
.charts{display:grid;grid-template-columns:1fr 1fr;gap:20px}
.bar-row{display:flex;align-items:center;gap:8px;font-size:.8rem;margin:4px 0}
.bar-label{width:80px;color:#8b949e}
.bar{height:14px;border-radius:3px}
.bar-pass{background:#198754}.bar-fail{background:#dc3545}.bar-quality{background:#0d6efd}
.test-result{border:1px solid #30363d;border-left-width:4px;border-radius:6px;padding:14px;margin-bottom:12px}
.test-result.success{border-left-color:#3fb950}
.test-result.error{border-left-color:#f85149}
.result-head{display:flex;justify-content:space-between;margin-bottom:8px}
.badge{padding:2px 8px;border-radius:4px;font-size:.75rem;font-weight:700;color:#fff}
.badge-pass{background:#198754}.badge-fail{background:#dc3545}
.block{background:#010409;border-radius:4px;padding:8px;margin:4px 0 10px;white-space:pre-wrap;word-wrap:break-word}
.block.expected{background:#21262d}
.alert{border-radius:4px;padding:8px;margin:4px 0 8px}
.alert-danger{background:#490202;color:#ffa198}
.alert-warning{background:#4b3800;color:#f2cc60}
.explain{font-size:.75rem;color:#8b949e;margin-bottom:8px}
.stats{display:grid;grid-template-columns:repeat(auto-fill,minmax(130px,1fr));gap:8px;font-size:.8rem}
.stats small{color:#8b949e;display:block}
.progress{background:#21262d;border-radius:4px;height:16px;overflow:hidden}
.progress-bar{background:#d29922;height:100%;font-size:.7rem;color:#000;text-align:center}
"#;

fn tone_class(tone: Tone) -> &'static str {
    match tone {
        Tone::Plain => "",
        Tone::Success => "tone-success",
        Tone::Info => "tone-info",
        Tone::Primary => "tone-primary",
        Tone::Warning => "tone-warning",
        Tone::Danger => "tone-danger",
    }
}

/// Percentages are clamped so a bad value cannot break the layout.
fn width_pct(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max * 100.0).clamp(0.0, 100.0)
}

pub fn render_summary(summary: &SummaryView) -> String {
    let mut html = String::new();
    for section in &summary.sections {
        let _ = write!(html, "<h2>{}</h2>\n<div class=\"metrics-grid\">\n", escape_html(section.title));
        for tile in &section.tiles {
            let _ = writeln!(
                html,
                "<div class=\"metric-card\"><div class=\"metric-value {}\">{}</div><div class=\"metric-label\">{}</div></div>",
                tone_class(tile.tone),
                escape_html(&tile.value),
                escape_html(tile.label)
            );
        }
        html.push_str("</div>\n");
    }
    html
}

fn render_success_chart(chart: Option<SuccessChart>) -> String {
    let mut html = String::from("<div><h2>Test Success Rate</h2>\n");
    match chart {
        Some(c) => {
            let total = (c.successful + c.failed) as f64;
            for (label, count, class) in [
                ("Successful", c.successful, "bar-pass"),
                ("Failed", c.failed, "bar-fail"),
            ] {
                let _ = writeln!(
                    html,
                    "<div class=\"bar-row\"><span class=\"bar-label\">{label}</span><div class=\"bar {class}\" style=\"width:{:.1}%\"></div><span>{count}</span></div>",
                    width_pct(count as f64, total)
                );
            }
        }
        None => html.push_str("<p class=\"meta\">N/A</p>\n"),
    }
    html.push_str("</div>\n");
    html
}

fn render_quality_chart(bars: &[QualityBar]) -> String {
    let mut html = String::from("<div><h2>Quality Scores by Test</h2>\n");
    if bars.is_empty() {
        html.push_str("<p class=\"meta\">No passing tests to chart.</p>\n");
    }
    for bar in bars {
        let _ = writeln!(
            html,
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span><div class=\"bar bar-quality\" style=\"width:{:.1}%\"></div><span>{}</span></div>",
            escape_html(&bar.label),
            width_pct(bar.score, 100.0),
            fmt_number(bar.score)
        );
    }
    html.push_str("</div>\n");
    html
}

pub fn render_case_detail(detail: &CaseDetail) -> String {
    let (status_class, badge_class) = if detail.passed() {
        ("success", "badge-pass")
    } else {
        ("error", "badge-fail")
    };
    let mut html = String::new();
    let _ = writeln!(html, "<div class=\"test-result {status_class}\">");
    let _ = writeln!(
        html,
        "<div class=\"result-head\"><strong>Test {}</strong><span class=\"badge {badge_class}\">{}</span></div>",
        detail.number,
        detail.badge()
    );
    let _ = writeln!(
        html,
        "<strong>Input:</strong><div class=\"block\"><code>{}</code></div>",
        escape_html(&detail.input)
    );
    if let Some(expected) = &detail.expected {
        let _ = writeln!(
            html,
            "<strong>Expected Output (Ground Truth):</strong><div class=\"block expected\">{}</div>",
            escape_html(expected)
        );
    }

    match &detail.outcome {
        Outcome::Pass { output, stats } => {
            let _ = writeln!(
                html,
                "<strong>Output:</strong><div class=\"block\">{}</div>",
                escape_html(output)
            );
            html.push_str("<div class=\"stats\">\n");
            for stat in stats {
                let _ = writeln!(
                    html,
                    "<div><small>{}:</small><strong class=\"{}\">{}</strong></div>",
                    escape_html(stat.label),
                    tone_class(stat.tone),
                    escape_html(&stat.value)
                );
            }
            html.push_str("</div>\n");
        }
        Outcome::SystemError { error } => {
            let _ = writeln!(
                html,
                "<strong>Error:</strong><div class=\"alert alert-danger\">{}</div>",
                escape_html(error)
            );
        }
        Outcome::EvaluationFailure { output, failure_reason, overlap_percent } => {
            let _ = writeln!(
                html,
                "<strong>Response:</strong><div class=\"block\">{}</div>",
                escape_html(output)
            );
            if let Some(reason) = failure_reason {
                let _ = writeln!(
                    html,
                    "<strong>Failure Reason:</strong><div class=\"alert alert-warning\">{}</div>",
                    escape_html(reason)
                );
                html.push_str("<div class=\"explain\"><strong>Ground Truth Evaluation Details:</strong><br>\n");
                for (label, text) in GROUND_TRUTH_DETAILS {
                    let _ = writeln!(html, "&bull; <strong>{label}:</strong> {}<br>", escape_html(text));
                }
                html.push_str("</div>\n");
            }
            if let Some(pct) = overlap_percent {
                let _ = writeln!(
                    html,
                    "<strong>Ground Truth Match:</strong> <span class=\"meta\">(pass at {OVERLAP_PASS_THRESHOLD}%)</span><div class=\"progress\"><div class=\"progress-bar\" style=\"width:{:.1}%\">{}%</div></div>",
                    width_pct(*pct, 100.0),
                    fmt_number(*pct)
                );
            }
        }
    }

    if !detail.passed() {
        let _ = writeln!(
            html,
            "<div class=\"meta\">Response Time: <strong>{}</strong></div>",
            escape_html(&detail.response_time)
        );
    }
    html.push_str("</div>\n");
    html
}

pub fn render_details(details: &[CaseDetail]) -> String {
    details.iter().map(render_case_detail).collect()
}

/// A complete HTML document for one batch run.
pub fn render_report(view: &BatchView, generated_at: DateTime<Utc>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>ChatMind Test Results</title>\n<style>");
    html.push_str(REPORT_CSS);
    html.push_str("</style>\n</head>\n<body>\n<h1>ChatMind Test Results</h1>\n");
    let _ = writeln!(
        html,
        "<p class=\"meta\">Generated {}</p>",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    html.push_str(&render_summary(&view.summary));
    html.push_str("<div class=\"charts\">\n");
    html.push_str(&render_success_chart(view.success_chart));
    html.push_str(&render_quality_chart(&view.quality_chart));
    html.push_str("</div>\n<h2>Detailed Results</h2>\n");
    html.push_str(&render_details(&view.details));
    html.push_str("</body>\n</html>\n");
    html
}

/// Write the report to `path`, creating parent directories as needed.
pub fn write_report(view: &BatchView, path: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_report(view, now))?;
    Ok(path.to_path_buf())
}

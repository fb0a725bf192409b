//! Coloured text for the CLI. Every function returns a `String` so callers
//! decide where it goes; colour is switched off globally with
//! `colored::control::set_override(false)`.

use std::fmt::Write as _;

use colored::*;

use crate::api::ModelInfo;
use crate::chat::{ApiStatus, Sender};
use crate::models::ActiveModel;
use crate::view::{
    fmt_number, BatchView, BubbleView, CaseDetail, CaseListItem, Outcome, SummaryView, Tone,
    EMPTY_CASE_LIST, GROUND_TRUTH_DETAILS, OVERLAP_PASS_THRESHOLD,
};

const RULE_WIDTH: usize = 50;
const BAR_WIDTH: usize = 30;

fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Plain => text.bright_white(),
        Tone::Success => text.bright_green(),
        Tone::Info => text.bright_cyan(),
        Tone::Primary => text.bright_blue(),
        Tone::Warning => text.bright_yellow(),
        Tone::Danger => text.bright_red(),
    }
}

fn rule() -> ColoredString {
    "=".repeat(RULE_WIDTH).bright_blue()
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 && value.is_finite() {
        ((value / max).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

pub fn summary(view: &SummaryView) -> String {
    let mut out = String::new();
    for section in &view.sections {
        let _ = writeln!(out, "{}", section.title.bright_cyan().bold());
        for tile in &section.tiles {
            let _ = writeln!(out, "  {:<20} {}", tile.label.bright_yellow(), paint(&tile.value, tile.tone));
        }
    }
    out
}

pub fn case_detail(detail: &CaseDetail) -> String {
    let mut out = String::new();
    let badge = if detail.passed() {
        " PASS ".on_green().bright_white().bold()
    } else {
        " FAIL ".on_red().bright_white().bold()
    };
    let _ = writeln!(out, "{} {}", format!("Test {}", detail.number).bold(), badge);
    let _ = writeln!(out, "  {} {}", "Input:".bright_yellow(), detail.input);
    if let Some(expected) = &detail.expected {
        let _ = writeln!(out, "  {} {}", "Expected:".bright_yellow(), expected);
    }
    match &detail.outcome {
        Outcome::Pass { output, stats } => {
            let _ = writeln!(out, "  {} {}", "Output:".bright_yellow(), output);
            for stat in stats {
                let _ = writeln!(out, "    {:<18} {}", stat.label.dimmed(), paint(&stat.value, stat.tone));
            }
        }
        Outcome::SystemError { error } => {
            let _ = writeln!(out, "  {} {}", "Error:".bright_red(), error.bright_red());
        }
        Outcome::EvaluationFailure { output, failure_reason, overlap_percent } => {
            let _ = writeln!(out, "  {} {}", "Response:".bright_yellow(), output);
            if let Some(reason) = failure_reason {
                let _ = writeln!(out, "  {} {}", "Failure Reason:".bright_yellow(), reason.yellow());
                for (label, text) in GROUND_TRUTH_DETAILS {
                    let _ = writeln!(out, "    {} {}", format!("{label}:").dimmed(), text.dimmed());
                }
            }
            if let Some(pct) = overlap_percent {
                let _ = writeln!(
                    out,
                    "  {} {} {}% (pass at {OVERLAP_PASS_THRESHOLD}%)",
                    "Ground Truth Match:".bright_yellow(),
                    bar(*pct, 100.0).yellow(),
                    fmt_number(*pct)
                );
            }
        }
    }
    if !detail.passed() {
        let _ = writeln!(out, "  {} {}", "Response Time:".dimmed(), detail.response_time);
    }
    out
}

pub fn batch(view: &BatchView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "TEST RESULTS".bright_cyan().bold());
    let _ = writeln!(out, "{}", rule());
    out.push_str(&summary(&view.summary));

    if let Some(chart) = view.success_chart {
        let total = (chart.successful + chart.failed) as f64;
        let _ = writeln!(out, "{}", "Test Success Rate".bright_cyan().bold());
        let _ = writeln!(out, "  {:<12} {} {}", "Successful", bar(chart.successful as f64, total).green(), chart.successful);
        let _ = writeln!(out, "  {:<12} {} {}", "Failed", bar(chart.failed as f64, total).red(), chart.failed);
    }
    if !view.quality_chart.is_empty() {
        let _ = writeln!(out, "{}", "Quality Scores by Test".bright_cyan().bold());
        for q in &view.quality_chart {
            let _ = writeln!(out, "  {:<12} {} {}", q.label, bar(q.score, 100.0).blue(), fmt_number(q.score));
        }
    }

    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "{}", "Detailed Results".bright_cyan().bold());
    for detail in &view.details {
        out.push_str(&case_detail(detail));
    }
    out
}

// ---------------------------------------------------------------------------
// Case list
// ---------------------------------------------------------------------------

pub fn case_list(items: &[CaseListItem]) -> String {
    if items.is_empty() {
        return format!("{}\n", EMPTY_CASE_LIST.dimmed());
    }
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Test Cases".bright_cyan().bold(), format!("({})", items.len()).dimmed());
    for item in items {
        let _ = writeln!(out, "  {} {}", item.label.bright_blue().bold(), item.question);
        if let Some(expected) = &item.expected {
            let _ = writeln!(out, "     {} {}", "Expected:".bright_green(), expected);
        }
        let _ = writeln!(out, "     {} {}", item.mode.badge().bright_cyan(), item.mode.explanation().dimmed());
    }
    out
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

pub fn bubble(b: &BubbleView) -> String {
    let who = match b.sender {
        Sender::User => "You".bright_blue().bold(),
        Sender::Ai => "AI".bright_green().bold(),
        Sender::System => "System".bright_magenta().bold(),
    };
    let content = if b.is_error {
        b.content.bright_red()
    } else if b.sender == Sender::System {
        b.content.bright_magenta()
    } else {
        b.content.normal()
    };
    let mut out = format!("{} {} {}\n", format!("[{}]", b.time).dimmed(), who, content);
    if let Some(meta) = &b.meta {
        let _ = writeln!(out, "    {}", meta.dimmed());
    }
    out
}

pub fn status(status: ApiStatus) -> ColoredString {
    match status {
        ApiStatus::Ready => status.label().bright_white(),
        ApiStatus::Sending => status.label().bright_yellow(),
        ApiStatus::Success => status.label().bright_green(),
        ApiStatus::Error => status.label().bright_red(),
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

pub fn active_model(active: Option<&ActiveModel>) -> String {
    match active {
        Some(m) => format!(
            "{}: {} {}\n",
            "Model".bright_yellow(),
            m.name.bright_white().bold(),
            format!("({})", m.provider).dimmed()
        ),
        None => format!("{}: {}\n", "Model".bright_yellow(), "N/A".dimmed()),
    }
}

pub fn model_registry<'a, I>(models: I, current: Option<&str>) -> String
where
    I: IntoIterator<Item = (&'a String, &'a ModelInfo)>,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", "AVAILABLE MODELS".bright_cyan().bold());
    let _ = writeln!(out, "{}", rule());
    for (id, info) in models {
        let marker = if current == Some(id.as_str()) { "*".bright_green().bold() } else { " ".normal() };
        let _ = writeln!(
            out,
            "{} {:<24} {} {}",
            marker,
            id.bright_white(),
            info.name.as_deref().unwrap_or("Unknown Model"),
            format!("[{}]", info.provider.as_deref().unwrap_or("Unknown Provider")).dimmed()
        );
    }
    out
}

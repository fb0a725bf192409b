//! Display-ready structures built from backend data.
//!
//! Nothing here touches a terminal or writes markup; [`crate::render`]
//! turns these into text. Missing optional metrics become `"N/A"` rather than
//! errors.

use crate::api::{BatchSummary, CaseMetrics, CaseResult, TestBatchResponse};
use crate::cases::{CaseId, TestCase};
use crate::chat::{ChatMessage, Sender};

pub const NOT_AVAILABLE: &str = "N/A";

/// Pass threshold the backend applies to ground-truth overlap, in percent.
pub const OVERLAP_PASS_THRESHOLD: u8 = 70;

pub const EMPTY_CASE_LIST: &str = "No test cases added yet. Add a question to get started.";

/// Copy shown under an evaluation failure.
pub const GROUND_TRUTH_DETAILS: [(&str, &str); 4] = [
    ("Method", "Keyword overlap comparison"),
    ("Threshold", "70% word match required for pass"),
    (
        "How it works",
        "Splits both expected answer and AI response into individual words, then calculates percentage of expected words found in the response",
    ),
    (
        "Why it failed",
        "The AI response contained too few words that match the expected answer",
    ),
];

/// Shortest decimal form, as a browser would print the number.
pub fn fmt_number(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        NOT_AVAILABLE.to_string()
    }
}

fn fmt_opt(v: Option<f64>, suffix: &str) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{}{suffix}", fmt_number(v)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn fmt_count(v: Option<u64>) -> String {
    v.map(|n| n.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn fmt_seconds(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.2}s"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Success,
    Info,
    Primary,
    Warning,
    Danger,
}

// ---------------------------------------------------------------------------
// Summary tiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

impl MetricTile {
    fn new(label: &'static str, value: String, tone: Tone) -> Self {
        MetricTile { label, value, tone }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSection {
    pub title: &'static str,
    pub tiles: Vec<MetricTile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub sections: Vec<MetricSection>,
}

impl SummaryView {
    pub fn tile(&self, label: &str) -> Option<&MetricTile> {
        self.sections
            .iter()
            .flat_map(|s| s.tiles.iter())
            .find(|t| t.label == label)
    }
}

pub fn summary_view(summary: &BatchSummary) -> SummaryView {
    let performance = MetricSection {
        title: "Performance Overview",
        tiles: vec![
            MetricTile::new("Total Tests", fmt_count(summary.total_tests), Tone::Plain),
            MetricTile::new("Successful", fmt_count(summary.successful_tests), Tone::Success),
            MetricTile::new("Success Rate", fmt_opt(summary.success_rate, "%"), Tone::Plain),
            MetricTile::new("Avg Response Time", fmt_opt(summary.avg_response_time, "s"), Tone::Plain),
            MetricTile::new(
                "Efficiency Rating",
                summary
                    .response_efficiency
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                Tone::Info,
            ),
        ],
    };
    let quality = MetricSection {
        title: "Quality Metrics",
        tiles: vec![
            MetricTile::new("Quality Score", fmt_opt(summary.avg_quality_score, ""), Tone::Primary),
            MetricTile::new("Confidence Score", fmt_opt(summary.avg_confidence_score, ""), Tone::Warning),
            MetricTile::new("Readability Score", fmt_opt(summary.avg_readability_score, ""), Tone::Plain),
            MetricTile::new("Info Density", fmt_opt(summary.avg_information_density, "%"), Tone::Info),
            MetricTile::new("Consistency", fmt_opt(summary.model_consistency, "%"), Tone::Plain),
        ],
    };
    let language = MetricSection {
        title: "Language Analysis",
        tiles: vec![
            MetricTile::new("Lexical Diversity", fmt_opt(summary.avg_lexical_diversity, ""), Tone::Plain),
            MetricTile::new("Words/Sentence", fmt_opt(summary.avg_words_per_sentence, ""), Tone::Plain),
            MetricTile::new("Total Words", fmt_count(summary.total_words_generated), Tone::Plain),
        ],
    };
    SummaryView { sections: vec![performance, quality, language] }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessChart {
    pub successful: u64,
    pub failed: u64,
}

/// Needs both counts; a summary without them has nothing to plot.
pub fn success_chart(summary: &BatchSummary) -> Option<SuccessChart> {
    let total = summary.total_tests?;
    let successful = summary.successful_tests?;
    Some(SuccessChart { successful, failed: total.saturating_sub(successful) })
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityBar {
    pub label: String,
    pub score: f64,
}

/// One bar per passing result that reports a quality score.
pub fn quality_chart(results: &[CaseResult]) -> Vec<QualityBar> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.success)
        .filter_map(|(i, r)| {
            let score = r.metrics.as_ref()?.quality_score?;
            let n = r.test_id.map(|id| id as usize).unwrap_or(i) + 1;
            Some(QualityBar { label: format!("Test {n}"), score })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-case detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pass {
        output: String,
        stats: Vec<Stat>,
    },
    /// The model call itself failed; only error text is available.
    SystemError { error: String },
    /// The model answered but did not clear the overlap threshold.
    EvaluationFailure {
        output: String,
        failure_reason: Option<String>,
        overlap_percent: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseDetail {
    pub number: usize,
    pub input: String,
    pub expected: Option<String>,
    pub outcome: Outcome,
    pub response_time: String,
}

impl CaseDetail {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Pass { .. })
    }

    pub fn badge(&self) -> &'static str {
        if self.passed() {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

fn pass_stats(response_time: Option<f64>, m: &CaseMetrics) -> Vec<Stat> {
    let stat = |label, value, tone| Stat { label, value, tone };
    vec![
        stat("Response Time", fmt_seconds(response_time), Tone::Plain),
        stat("Quality Score", fmt_opt(m.quality_score, "/100"), Tone::Primary),
        stat("Confidence", fmt_opt(m.confidence_score, "/100"), Tone::Warning),
        stat("Readability", fmt_opt(m.readability_score, ""), Tone::Plain),
        stat("Word Count", fmt_opt(m.word_count, ""), Tone::Plain),
        stat("Info Density", fmt_opt(m.information_density, "%"), Tone::Info),
        stat("Lexical Diversity", fmt_opt(m.lexical_diversity, ""), Tone::Plain),
        stat("Words/Sentence", fmt_opt(m.words_per_sentence, ""), Tone::Plain),
        stat("Sentences", fmt_opt(m.sentence_count, ""), Tone::Plain),
        stat("Avg Word Length", fmt_opt(m.avg_word_length, " chars"), Tone::Plain),
    ]
}

pub fn case_detail(index: usize, result: &CaseResult) -> CaseDetail {
    let outcome = if result.success {
        let metrics = result.metrics.clone().unwrap_or_default();
        Outcome::Pass {
            output: result.output.clone().unwrap_or_default(),
            stats: pass_stats(result.response_time, &metrics),
        }
    } else if let Some(error) = &result.error {
        Outcome::SystemError { error: error.clone() }
    } else {
        Outcome::EvaluationFailure {
            output: result.output.clone().unwrap_or_default(),
            failure_reason: result.failure_reason.clone(),
            overlap_percent: result.metrics.as_ref().and_then(|m| m.truth_overlap_percent),
        }
    };
    CaseDetail {
        number: index + 1,
        input: result.input.clone().unwrap_or_default(),
        expected: result.expected_output.clone().filter(|e| !e.is_empty()),
        outcome,
        response_time: fmt_seconds(result.response_time),
    }
}

pub fn case_details(results: &[CaseResult]) -> Vec<CaseDetail> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| case_detail(i, r))
        .collect()
}

/// Everything the results page shows for one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchView {
    pub summary: SummaryView,
    pub success_chart: Option<SuccessChart>,
    pub quality_chart: Vec<QualityBar>,
    pub details: Vec<CaseDetail>,
}

pub fn batch_view(response: &TestBatchResponse) -> BatchView {
    BatchView {
        summary: summary_view(&response.summary),
        success_chart: success_chart(&response.summary),
        quality_chart: quality_chart(&response.results),
        details: case_details(&response.results),
    }
}

// ---------------------------------------------------------------------------
// Case list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    GroundTruth,
    Heuristic,
}

impl EvaluationMode {
    pub fn badge(&self) -> &'static str {
        match self {
            EvaluationMode::GroundTruth => "Ground Truth Evaluation",
            EvaluationMode::Heuristic => "Heuristic Evaluation",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            EvaluationMode::GroundTruth => {
                "Compares AI response keywords with expected answer. Requires 70%+ word overlap to pass."
            }
            EvaluationMode::Heuristic => {
                "Uses quality indicators like response length, coherence, and confidence markers to score the answer."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseListItem {
    pub label: String,
    pub id: CaseId,
    pub question: String,
    pub expected: Option<String>,
    pub mode: EvaluationMode,
}

pub fn case_list_view(cases: &[TestCase]) -> Vec<CaseListItem> {
    cases
        .iter()
        .enumerate()
        .map(|(i, c)| CaseListItem {
            label: format!("Q{}", i + 1),
            id: c.id,
            question: c.question.clone(),
            expected: c.expected.clone(),
            mode: if c.has_ground_truth() {
                EvaluationMode::GroundTruth
            } else {
                EvaluationMode::Heuristic
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Chat bubbles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleView {
    pub sender: Sender,
    pub content: String,
    pub time: String,
    /// "Response time: 1.23s" when the backend reported one.
    pub meta: Option<String>,
    pub is_error: bool,
}

pub fn bubble_view(message: &ChatMessage) -> BubbleView {
    BubbleView {
        sender: message.sender,
        content: message.content.clone(),
        time: message.timestamp.format("%H:%M:%S").to_string(),
        meta: message
            .response_time
            .filter(|t| *t > 0.0)
            .map(|t| format!("Response time: {t:.2}s")),
        is_error: message.is_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number_matches_browser_style() {
        assert_eq!(fmt_number(72.0), "72");
        assert_eq!(fmt_number(72.5), "72.5");
        assert_eq!(fmt_number(0.857), "0.857");
        assert_eq!(fmt_number(f64::NAN), "N/A");
    }

    #[test]
    fn test_summary_missing_metrics_are_na() {
        let summary = BatchSummary {
            total_tests: Some(2),
            successful_tests: Some(1),
            ..Default::default()
        };
        let view = summary_view(&summary);
        assert_eq!(view.tile("Total Tests").unwrap().value, "2");
        assert_eq!(view.tile("Quality Score").unwrap().value, "N/A");
        assert_eq!(view.tile("Efficiency Rating").unwrap().value, "N/A");
        assert_eq!(view.tile("Total Words").unwrap().value, "N/A");
        assert_eq!(view.sections.len(), 3);
    }

    #[test]
    fn test_summary_suffixes() {
        let summary = BatchSummary {
            success_rate: Some(50.0),
            avg_response_time: Some(1.25),
            avg_information_density: Some(81.3),
            ..Default::default()
        };
        let view = summary_view(&summary);
        assert_eq!(view.tile("Success Rate").unwrap().value, "50%");
        assert_eq!(view.tile("Avg Response Time").unwrap().value, "1.25s");
        assert_eq!(view.tile("Info Density").unwrap().value, "81.3%");
    }

    #[test]
    fn test_success_chart() {
        let summary = BatchSummary {
            total_tests: Some(5),
            successful_tests: Some(3),
            ..Default::default()
        };
        assert_eq!(success_chart(&summary), Some(SuccessChart { successful: 3, failed: 2 }));
        assert_eq!(success_chart(&BatchSummary::default()), None);
    }

    #[test]
    fn test_quality_chart_only_successful() {
        let results = vec![
            CaseResult {
                test_id: Some(0),
                success: true,
                metrics: Some(CaseMetrics { quality_score: Some(80.0), ..Default::default() }),
                ..Default::default()
            },
            CaseResult { test_id: Some(1), success: false, ..Default::default() },
            CaseResult {
                test_id: Some(2),
                success: true,
                metrics: Some(CaseMetrics { quality_score: Some(64.0), ..Default::default() }),
                ..Default::default()
            },
        ];
        let bars = quality_chart(&results);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].label, "Test 3");
        assert_eq!(bars[1].score, 64.0);
    }

    #[test]
    fn test_failure_shapes() {
        let system = CaseResult {
            success: false,
            input: Some("q".into()),
            error: Some("Network error: refused".into()),
            response_time: Some(0.5),
            ..Default::default()
        };
        let eval = CaseResult {
            success: false,
            input: Some("2+2?".into()),
            expected_output: Some("4".into()),
            output: Some("It is four.".into()),
            failure_reason: Some("Ground truth mismatch - expected content similarity too low (0.0% match)".into()),
            metrics: Some(CaseMetrics { truth_overlap_percent: Some(0.0), ..Default::default() }),
            response_time: Some(1.0),
            ..Default::default()
        };
        let details = case_details(&[system, eval]);
        assert!(matches!(details[0].outcome, Outcome::SystemError { .. }));
        match &details[1].outcome {
            Outcome::EvaluationFailure { output, failure_reason, overlap_percent } => {
                assert_eq!(output, "It is four.");
                assert!(failure_reason.as_deref().unwrap().contains("0.0% match"));
                assert_eq!(*overlap_percent, Some(0.0));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(details[1].badge(), "FAIL");
        assert_eq!(details[1].expected.as_deref(), Some("4"));
        assert_eq!(details[1].response_time, "1.00s");
    }

    #[test]
    fn test_pass_without_metrics_is_na() {
        let pass = CaseResult { success: true, output: Some("ok".into()), ..Default::default() };
        let detail = case_detail(0, &pass);
        assert_eq!(detail.badge(), "PASS");
        match detail.outcome {
            Outcome::Pass { stats, .. } => {
                assert!(stats.iter().all(|s| s.value == "N/A"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_case_list_modes() {
        let mut list = crate::cases::TestCaseList::with_first_id(1);
        list.add("a", None).unwrap();
        list.add("b", Some("x")).unwrap();
        let items = case_list_view(list.cases());
        assert_eq!(items[0].label, "Q1");
        assert_eq!(items[0].mode, EvaluationMode::Heuristic);
        assert_eq!(items[1].mode.badge(), "Ground Truth Evaluation");
        assert!(items[1].mode.explanation().contains("70%"));
    }
}

//! Batch test runs: submit the whole case list, keep the last response,
//! export it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{TestBatchRequest, TestBatchResponse};
use crate::cases::{CaseId, Draft, TestCase, TestCaseList};
use crate::client::Backend;
use crate::error::{ChatmindError, Result};
use crate::view::{batch_view, case_list_view, BatchView, CaseListItem};

pub const EXPORT_PREFIX: &str = "mistral_ai_test_results_";

/// `mistral_ai_test_results_<ts>.json`, where `<ts>` is the UTC ISO 8601
/// time to the millisecond with every `:` and `.` turned into `-`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{EXPORT_PREFIX}{stamp}.json")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Submitting,
}

/// The determinate progress surface shown while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub percent: u8,
    pub text: String,
}

/// A completed run. `raw` is exactly what the backend sent and is what gets
/// exported; `response` is the typed reading of it.
#[derive(Debug, Clone)]
pub struct TestBatchResult {
    pub run_id: String,
    pub raw: Value,
    pub response: TestBatchResponse,
}

impl TestBatchResult {
    pub fn view(&self) -> BatchView {
        batch_view(&self.response)
    }
}

pub struct TestBatchController<B> {
    backend: B,
    cases: TestCaseList,
    state: BatchState,
    progress: Option<Progress>,
    last: Option<TestBatchResult>,
}

impl<B: Backend> TestBatchController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_cases(backend, TestCaseList::new())
    }

    pub fn with_cases(backend: B, cases: TestCaseList) -> Self {
        TestBatchController {
            backend,
            cases,
            state: BatchState::Idle,
            progress: None,
            last: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    pub fn last_result(&self) -> Option<&TestBatchResult> {
        self.last.as_ref()
    }

    /// Export only becomes available after the first successful run.
    pub fn export_enabled(&self) -> bool {
        self.last.is_some()
    }

    // -- case list ------------------------------------------------------------

    pub fn cases(&self) -> &[TestCase] {
        self.cases.cases()
    }

    pub fn case_list_view(&self) -> Vec<CaseListItem> {
        case_list_view(self.cases.cases())
    }

    pub fn add(&mut self, question: &str, expected: Option<&str>) -> Result<&[TestCase]> {
        self.cases.add(question, expected)
    }

    pub fn remove(&mut self, id: CaseId) -> &[TestCase] {
        self.cases.remove(id)
    }

    pub fn clear<F: FnOnce(usize) -> bool>(&mut self, confirm: F) -> bool {
        self.cases.clear(confirm)
    }

    pub fn edit(&mut self, id: CaseId) -> Option<Draft> {
        self.cases.edit(id)
    }

    pub fn seed_samples(&mut self) -> usize {
        self.cases.seed_samples()
    }

    pub fn import_csv(&mut self, text: &str) -> Result<usize> {
        self.cases.import_csv(text)
    }

    pub fn import_csv_file(&mut self, path: &Path) -> Result<usize> {
        self.cases.import_csv_file(path)
    }

    pub fn pipe_text(&self) -> String {
        self.cases.to_pipe_text()
    }

    pub fn replace_from_pipe_text(&mut self, text: &str) -> usize {
        self.cases.replace_from_pipe_text(text)
    }

    // -- submission -------------------------------------------------------------

    pub async fn run(&mut self) -> Result<&TestBatchResult> {
        self.run_with_progress(|_| {}).await
    }

    /// Submit every case as one batch.
    ///
    /// An empty list is rejected before any request. On success the response
    /// replaces the stored result in full; on failure the stored result is
    /// left as it was. The progress surface is cleared either way.
    pub async fn run_with_progress<F>(&mut self, mut on_progress: F) -> Result<&TestBatchResult>
    where
        F: FnMut(&Progress),
    {
        if self.cases.is_empty() {
            return Err(ChatmindError::Validation("Please enter test cases".to_string()));
        }

        let request = TestBatchRequest { test_cases: self.cases.to_requests() };
        let run_id = Uuid::new_v4().to_string();
        let progress = Progress {
            percent: 0,
            text: format!("Preparing {} test cases...", request.test_cases.len()),
        };
        on_progress(&progress);
        self.progress = Some(progress);
        self.state = BatchState::Submitting;
        info!(%run_id, cases = request.test_cases.len(), "submitting test batch");

        let outcome = self.backend.run_tests(&request).await;
        self.state = BatchState::Idle;
        self.progress = None;

        let raw = outcome.map_err(|e| match e {
            ChatmindError::Timeout(detail) => {
                warn!(%run_id, %detail, "test batch timed out");
                ChatmindError::Timeout("Test execution timed out".to_string())
            }
            ChatmindError::Application(message) => ChatmindError::Application(message),
            other => {
                warn!(%run_id, error = %other, "test batch request failed");
                ChatmindError::Transport("Test execution failed".to_string())
            }
        })?;

        let response: TestBatchResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            ChatmindError::Transport(format!("Test execution failed: unreadable response ({e})"))
        })?;
        if !response.success {
            let message = response.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(ChatmindError::Application(format!("Test failed: {message}")));
        }

        info!(
            %run_id,
            results = response.results.len(),
            passed = response.results.iter().filter(|r| r.success).count(),
            "test batch completed"
        );
        let result = TestBatchResult { run_id, raw, response };
        Ok(&*self.last.insert(result))
    }

    // -- export -------------------------------------------------------------------

    /// Write the last raw response, pretty-printed, into `dir`.
    pub fn export(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let last = self
            .last
            .as_ref()
            .ok_or_else(|| ChatmindError::Validation("No test results to export".to_string()))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(export_filename(now));
        let body = serde_json::to_string_pretty(&last.raw)?;
        std::fs::write(&path, body)?;
        info!(path = %path.display(), run_id = %last.run_id, "exported test results");
        Ok(path)
    }
}

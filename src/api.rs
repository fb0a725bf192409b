//! Wire types for the ChatMind backend.
//!
//! Every response carries a `success` flag; failures put a human-readable
//! message in `error`. Optional fields default so a sparse or older backend
//! still deserializes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// -- Model registry ----------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub success: bool,
    #[serde(default)]
    pub current_model: Option<String>,
    #[serde(default)]
    pub models: BTreeMap<String, ModelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetModelRequest {
    pub model: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetModelResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_model: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// -- Chat ----------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_message: String,
    pub ai_response: String,
    /// Naive ISO 8601 as written by the backend, e.g. `2024-05-01T12:30:00.123456`.
    pub timestamp: String,
    #[serde(default)]
    pub response_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// -- Batch testing -------------------------------------------------------------

/// One case as the batch endpoint expects it. `expected_output` is sent as
/// `null` when absent; its presence is what switches the backend to overlap
/// scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRequest {
    pub input: String,
    pub expected_output: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestBatchRequest {
    pub test_cases: Vec<TestCaseRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSummary {
    pub total_tests: Option<u64>,
    pub successful_tests: Option<u64>,
    pub success_rate: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub avg_quality_score: Option<f64>,
    pub avg_confidence_score: Option<f64>,
    pub avg_readability_score: Option<f64>,
    pub avg_information_density: Option<f64>,
    pub avg_lexical_diversity: Option<f64>,
    pub avg_words_per_sentence: Option<f64>,
    pub total_words_generated: Option<u64>,
    pub model_consistency: Option<f64>,
    pub response_efficiency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseMetrics {
    pub quality_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub readability_score: Option<f64>,
    pub word_count: Option<f64>,
    pub sentence_count: Option<f64>,
    pub information_density: Option<f64>,
    pub lexical_diversity: Option<f64>,
    pub words_per_sentence: Option<f64>,
    pub avg_word_length: Option<f64>,
    pub truth_overlap_percent: Option<f64>,
    pub evaluation_method: Option<String>,
    pub has_ground_truth: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    #[serde(default)]
    pub test_id: Option<u64>,
    pub success: bool,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub metrics: Option<CaseMetrics>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub summary: BatchSummary,
    #[serde(default)]
    pub results: Vec<CaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body shape of non-2xx responses that carry a message.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_response_deserializes() {
        let json = r#"{"success":true,"current_model":"mistral","models":{
            "mistral":{"name":"Mistral 7B Instruct","provider":"Mistral AI","model_id":"m","api_type":"openrouter"},
            "gpt4o":{"name":"GPT-4o Mini","provider":"OpenAI via OpenRouter"}}}"#;
        let resp: ModelsResponse = serde_json::from_str(json).expect("deser");
        assert!(resp.success);
        assert_eq!(resp.current_model.as_deref(), Some("mistral"));
        assert_eq!(resp.models.len(), 2);
        assert_eq!(resp.models["gpt4o"].name.as_deref(), Some("GPT-4o Mini"));
    }

    #[test]
    fn test_test_case_request_serializes_null_expected() {
        let req = TestCaseRequest { input: "What is AI?".into(), expected_output: None };
        let v: serde_json::Value = serde_json::to_value(&req).expect("ser");
        assert_eq!(v["input"], "What is AI?");
        assert!(v["expected_output"].is_null());
        assert!(v.as_object().expect("object").contains_key("expected_output"));
    }

    #[test]
    fn test_batch_response_with_sparse_summary() {
        let json = r#"{"success":true,"summary":{"total_tests":2,"successful_tests":1},"results":[]}"#;
        let resp: TestBatchResponse = serde_json::from_str(json).expect("deser");
        assert_eq!(resp.summary.total_tests, Some(2));
        assert!(resp.summary.avg_quality_score.is_none());
        assert!(resp.summary.response_efficiency.is_none());
    }

    #[test]
    fn test_case_result_error_record() {
        let json = r#"{"test_id":0,"success":false,"input":"hi","error":"API key not configured","response_time":0}"#;
        let r: CaseResult = serde_json::from_str(json).expect("deser");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("API key not configured"));
        assert!(r.metrics.is_none());
        assert_eq!(r.response_time, Some(0.0));
    }

    #[test]
    fn test_case_metrics_ignore_unknown_fields() {
        let json = r#"{"quality_score":72,"question_count":1,"relevance_score":20.0}"#;
        let m: CaseMetrics = serde_json::from_str(json).expect("deser");
        assert_eq!(m.quality_score, Some(72.0));
    }

    #[test]
    fn test_chat_error_response() {
        let json = r#"{"success":false,"error":"Request timeout - API took too long to respond"}"#;
        let r: ChatResponse = serde_json::from_str(json).expect("deser");
        assert!(!r.success);
        assert!(r.response.is_none());
        assert!(r.error.unwrap().starts_with("Request timeout"));
    }

    #[test]
    fn test_history_entry_without_response_time() {
        let json = r#"{"success":true,"history":[{"user_message":"a","ai_response":"b","timestamp":"2024-05-01T12:30:00"}]}"#;
        let r: HistoryResponse = serde_json::from_str(json).expect("deser");
        assert_eq!(r.history.len(), 1);
        assert!(r.history[0].response_time.is_none());
    }
}

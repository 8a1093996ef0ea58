// src/evaluator/mod.rs — Review evaluation data model and model rosters
//
// A golden test case is known-bad code plus the keywords a correct review must
// mention. Matching is a case-insensitive substring check so CI pass/fail
// decisions are reproducible.

pub mod golden;
pub mod multi_model;
pub mod single;

use serde::{Deserialize, Serialize};

pub use multi_model::{format_multi_model_report, MultiModelEvaluator};
pub use single::ReviewEvaluator;

/// One LLM endpoint in a review roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub model_id: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_provider() -> String {
    "openrouter".into()
}

fn default_weight() -> f64 {
    1.0
}

impl ModelConfig {
    pub fn new(name: &str, model_id: &str) -> Self {
        Self {
            name: name.to_string(),
            model_id: model_id.to_string(),
            provider: default_provider(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Known-bad code and the substrings a correct review must contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenTestCase {
    pub id: String,
    pub file_path: String,
    pub code: String,
    pub expected_issues: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
    pub category: String,
}

pub(crate) fn default_severity() -> String {
    "high".into()
}

/// One model's review of one test case. `passed` iff nothing was missed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReviewResult {
    pub model_name: String,
    pub model_id: String,
    pub review_text: String,
    pub matched_issues: Vec<String>,
    pub missed_issues: Vec<String>,
    pub passed: bool,
    #[serde(default)]
    pub latency_ms: f64,
}

/// Aggregated findings of a whole roster for one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiModelResult {
    pub test_id: String,
    pub model_results: Vec<ModelReviewResult>,
    /// Found by a strict majority (`N/2 + 1`) of models.
    pub consensus_issues: Vec<String>,
    /// Found by every model.
    pub unanimous_issues: Vec<String>,
    /// Found by at least one model.
    pub any_model_issues: Vec<String>,
    pub consensus_passed: bool,
    pub models_passed: usize,
    pub total_models: usize,
}

impl MultiModelResult {
    /// Fraction of models that passed, 0 for an empty roster.
    pub fn pass_rate(&self) -> f64 {
        if self.total_models == 0 {
            0.0
        } else {
            self.models_passed as f64 / self.total_models as f64
        }
    }
}

/// Single-model review outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub test_id: String,
    pub passed: bool,
    pub review_text: String,
    pub matched_issues: Vec<String>,
    pub missed_issues: Vec<String>,
}

/// Split `expected` into (matched, missed) by case-insensitive substring
/// search of `review_text`. Both keep the order of `expected`.
pub fn match_expected_issues(expected: &[String], review_text: &str) -> (Vec<String>, Vec<String>) {
    let haystack = review_text.to_lowercase();
    expected
        .iter()
        .cloned()
        .partition(|issue| haystack.contains(&issue.to_lowercase()))
}

/// Production roster: three frontier models.
pub fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig::new("Claude Opus 4.5", "anthropic/claude-opus-4.5"),
        ModelConfig::new("GPT-5.1 Codex", "openai/gpt-5.1-codex"),
        ModelConfig::new("Gemini 3 Pro", "google/gemini-3-pro-preview"),
    ]
}

/// Extended roster for benchmarking, weighted by tier.
pub fn benchmark_models() -> Vec<ModelConfig> {
    let mut models = default_models();
    models.extend([
        ModelConfig::new("Claude 3.5 Sonnet", "anthropic/claude-3.5-sonnet").with_weight(0.9),
        ModelConfig::new("GPT-4o", "openai/gpt-4o").with_weight(0.9),
        ModelConfig::new("Gemini 2.5 Pro", "google/gemini-2.5-pro-preview-05-06").with_weight(0.9),
        ModelConfig::new("Claude 3.5 Haiku", "anthropic/claude-3.5-haiku").with_weight(0.7),
        ModelConfig::new("GPT-4o Mini", "openai/gpt-4o-mini").with_weight(0.7),
        ModelConfig::new("Gemini 2.0 Flash", "google/gemini-2.0-flash-001").with_weight(0.7),
        ModelConfig::new("DeepSeek V3", "deepseek/deepseek-chat").with_weight(0.8),
        ModelConfig::new("Llama 3.3 70B", "meta-llama/llama-3.3-70b-instruct").with_weight(0.6),
        ModelConfig::new("Qwen 2.5 72B", "qwen/qwen-2.5-72b-instruct").with_weight(0.6),
        ModelConfig::new("Mistral Large", "mistralai/mistral-large-2411").with_weight(0.7),
    ]);
    models
}

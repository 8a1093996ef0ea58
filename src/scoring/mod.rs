// src/scoring/mod.rs — PR scoring data model
//
// Score = Σ(category score × weight) − critical penalties, clamped to [0, 100].

pub mod engine;
pub mod report;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::infra::config::ReviewerConfig;
use crate::infra::errors::ReviewEvalError;

pub use engine::ScoringEngine;

/// Free-form diagnostic detail attached to a ScoringResult.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// Turn a `json!({...})` object into a Details map.
pub fn details(value: serde_json::Value) -> Details {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Details::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Tests,
    Coverage,
    StaticAnalysis,
    AiReview,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [
        MetricCategory::Tests,
        MetricCategory::Coverage,
        MetricCategory::StaticAnalysis,
        MetricCategory::AiReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Tests => "tests",
            MetricCategory::Coverage => "coverage",
            MetricCategory::StaticAnalysis => "static_analysis",
            MetricCategory::AiReview => "ai_review",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one collector for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub category: MetricCategory,
    pub raw_value: f64,
    /// 0–100.
    pub normalized_score: f64,
    pub weight: f64,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ScoringResult {
    pub fn new(
        category: MetricCategory,
        weight: f64,
        raw_value: f64,
        normalized_score: f64,
        details: Details,
    ) -> Self {
        Self {
            category,
            raw_value,
            normalized_score,
            weight,
            details,
            error_message: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Numeric detail value, accepting integers or floats.
    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.details.get(key).and_then(|v| v.as_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreStatus {
    Pass,
    Fail,
}

impl ScoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Pass => "PASS",
            ScoreStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PRScore {
    pub total_score: f64,
    pub status: ScoreStatus,
    pub threshold: f64,
    pub blocking_factors: Vec<String>,
    pub breakdown: BTreeMap<MetricCategory, ScoringResult>,
    pub timestamp: String,
}

impl PRScore {
    pub fn passed(&self) -> bool {
        self.status == ScoreStatus::Pass
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub const SECURITY_PENALTY: &str = "security_vulnerability";
pub const TEST_FAILURE_PENALTY: &str = "critical_test_failure";
pub const COVERAGE_TOLERANCE: &str = "coverage_delta";

/// Allowed drift of the weight sum from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub threshold: f64,
    pub weights: BTreeMap<MetricCategory, f64>,
    pub critical_penalties: BTreeMap<String, f64>,
    pub tolerance: BTreeMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: 80.0,
            weights: BTreeMap::from([
                (MetricCategory::Tests, 0.30),
                (MetricCategory::Coverage, 0.20),
                (MetricCategory::StaticAnalysis, 0.20),
                (MetricCategory::AiReview, 0.30),
            ]),
            critical_penalties: BTreeMap::from([
                (SECURITY_PENALTY.to_string(), 100.0),
                (TEST_FAILURE_PENALTY.to_string(), 50.0),
            ]),
            tolerance: BTreeMap::from([(COVERAGE_TOLERANCE.to_string(), 0.1)]),
        }
    }
}

impl ScoringConfig {
    /// Parse the `scoring:` section of a reviewer.yaml document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ReviewEvalError> {
        Ok(ReviewerConfig::from_yaml_str(content)?
            .scoring
            .to_scoring_config())
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn validate_weights(&self) -> bool {
        (self.weight_sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE
    }

    /// Configured weight, 0 for categories not in the map.
    pub fn weight_for(&self, category: MetricCategory) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }

    /// Configured penalty, 0 when the name is absent.
    pub fn penalty(&self, name: &str) -> f64 {
        self.critical_penalties.get(name).copied().unwrap_or(0.0)
    }

    pub fn tolerance(&self, name: &str) -> Option<f64> {
        self.tolerance.get(name).copied()
    }
}

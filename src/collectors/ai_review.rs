// src/collectors/ai_review.rs — Consensus findings from multi-model review
//
// Consensus issues from every result are flattened and classified by keyword.
// No results at all scores 100: absence of findings is read as absence of
// issues, and the result carries a warning saying so.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::MetricCollector;
use crate::evaluator::MultiModelResult;
use crate::scoring::{details, MetricCategory, ScoringResult};

const DEFAULT_WEIGHT: f64 = 0.30;

const SECURITY_KEYWORDS: &[&str] = &[
    "injection",
    "security",
    "vulnerability",
    "xss",
    "csrf",
    "secret",
    "credential",
    "authentication",
    "authorization",
    "sql injection",
    "command injection",
    "hardcoded",
];
const HIGH_KEYWORDS: &[&str] = &["critical", "severe", "dangerous", "unsafe"];
const MEDIUM_KEYWORDS: &[&str] = &["warning", "caution", "consider"];

/// Listed consensus issues kept in the result details.
const LISTED_ISSUES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Security,
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    pub fn deduction(self) -> f64 {
        match self {
            IssueSeverity::Security => 50.0,
            IssueSeverity::High => 20.0,
            IssueSeverity::Medium => 5.0,
            IssueSeverity::Low => 1.0,
        }
    }
}

/// First matching keyword group wins: security, high, medium, else low.
pub fn classify_issue(issue: &str) -> IssueSeverity {
    let lower = issue.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if hit(SECURITY_KEYWORDS) {
        IssueSeverity::Security
    } else if hit(HIGH_KEYWORDS) {
        IssueSeverity::High
    } else if hit(MEDIUM_KEYWORDS) {
        IssueSeverity::Medium
    } else {
        IssueSeverity::Low
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeverityCounts {
    pub security: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SeverityCounts {
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match classify_issue(issue) {
                IssueSeverity::Security => counts.security += 1,
                IssueSeverity::High => counts.high += 1,
                IssueSeverity::Medium => counts.medium += 1,
                IssueSeverity::Low => counts.low += 1,
            }
        }
        counts
    }

    /// `max(0, 100 − 50·security − 20·high − 5·medium − 1·low)`
    pub fn score(&self) -> f64 {
        let deductions = self.security as f64 * IssueSeverity::Security.deduction()
            + self.high as f64 * IssueSeverity::High.deduction()
            + self.medium as f64 * IssueSeverity::Medium.deduction()
            + self.low as f64 * IssueSeverity::Low.deduction();
        (100.0 - deductions).max(0.0)
    }
}

pub struct AiReviewCollector {
    review_results: Vec<MultiModelResult>,
    review_results_path: Option<PathBuf>,
    weight: f64,
}

impl AiReviewCollector {
    pub fn new(review_results: Vec<MultiModelResult>) -> Self {
        Self {
            review_results,
            review_results_path: None,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Read results from a JSON array of MultiModelResult. Takes precedence
    /// over in-memory results when the file exists.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            review_results: Vec::new(),
            review_results_path: Some(path.into()),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    async fn load_results(&self) -> Result<Option<Vec<MultiModelResult>>, String> {
        let Some(path) = self.review_results_path.as_ref().filter(|p| p.exists()) else {
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        let data: Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        let Value::Array(items) = data else {
            return Err(format!(
                "expected a JSON array of review results in {}",
                path.display()
            ));
        };

        let results = items
            .into_iter()
            .filter(Value::is_object)
            .map(serde_json::from_value)
            .collect::<Result<Vec<MultiModelResult>, _>>()
            .map_err(|e| e.to_string())?;
        Ok(Some(results))
    }

    fn score(&self, results: &[MultiModelResult]) -> ScoringResult {
        if results.is_empty() {
            return ScoringResult::new(
                MetricCategory::AiReview,
                self.weight,
                0.0,
                100.0,
                details(json!({
                    "total_reviews": 0,
                    "warning": "No AI review results available",
                })),
            );
        }

        let issues: Vec<&str> = results
            .iter()
            .flat_map(|r| r.consensus_issues.iter().map(String::as_str))
            .collect();
        let counts = SeverityCounts::tally(issues.iter().copied());

        ScoringResult::new(
            MetricCategory::AiReview,
            self.weight,
            issues.len() as f64,
            counts.score(),
            details(json!({
                "total_reviews": results.len(),
                "total_consensus_issues": issues.len(),
                "security_issues": counts.security,
                "high_severity": counts.high,
                "medium_severity": counts.medium,
                "low_severity": counts.low,
                "consensus_issues": issues.iter().take(LISTED_ISSUES).collect::<Vec<_>>(),
            })),
        )
    }
}

#[async_trait]
impl MetricCollector for AiReviewCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::AiReview
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn collect(&self) -> ScoringResult {
        match self.load_results().await {
            Ok(Some(loaded)) => self.score(&loaded),
            Ok(None) => self.score(&self.review_results),
            Err(e) => ScoringResult::new(
                MetricCategory::AiReview,
                self.weight,
                0.0,
                50.0,
                details(json!({ "error": e })),
            )
            .with_error(format!("Unexpected error collecting AI review results: {e}")),
        }
    }
}

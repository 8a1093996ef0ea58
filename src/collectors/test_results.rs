// src/collectors/test_results.rs — JUnit XML test results
//
// Accepts either a <testsuites> root (counts summed over member suites) or a
// single <testsuite> root.

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;

use super::MetricCollector;
use crate::scoring::{details, MetricCategory, ScoringResult};

const DEFAULT_WEIGHT: f64 = 0.30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JunitCounts {
    pub total: u64,
    pub failures: u64,
    pub errors: u64,
    pub skipped: u64,
}

impl JunitCounts {
    pub fn passed(&self) -> u64 {
        self.total
            .saturating_sub(self.failures.saturating_add(self.errors))
    }

    fn add(&mut self, other: JunitCounts) -> Result<(), JunitError> {
        let sum = |a: u64, b: u64, attr: &'static str| {
            a.checked_add(b).ok_or(JunitError::Overflow { attr })
        };
        *self = JunitCounts {
            total: sum(self.total, other.total, "tests")?,
            failures: sum(self.failures, other.failures, "failures")?,
            errors: sum(self.errors, other.errors, "errors")?,
            skipped: sum(self.skipped, other.skipped, "skipped")?,
        };
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JunitError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("unknown root element {0}")]
    UnknownRoot(String),
    #[error("attribute {attr}=\"{value}\" is not a count")]
    BadCount { attr: &'static str, value: String },
    #[error("summed {attr} count overflows")]
    Overflow { attr: &'static str },
}

fn count_attr(node: roxmltree::Node<'_, '_>, attr: &'static str) -> Result<u64, JunitError> {
    match node.attribute(attr) {
        None => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| JunitError::BadCount {
            attr,
            value: value.to_string(),
        }),
    }
}

fn suite_counts(node: roxmltree::Node<'_, '_>) -> Result<JunitCounts, JunitError> {
    Ok(JunitCounts {
        total: count_attr(node, "tests")?,
        failures: count_attr(node, "failures")?,
        errors: count_attr(node, "errors")?,
        skipped: count_attr(node, "skipped")?,
    })
}

/// Parse JUnit XML into aggregate counts.
pub fn parse_junit(xml: &str) -> Result<JunitCounts, JunitError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "testsuites" => {
            let mut counts = JunitCounts::default();
            for suite in root
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "testsuite")
            {
                counts.add(suite_counts(suite)?)?;
            }
            Ok(counts)
        }
        "testsuite" => suite_counts(root),
        other => Err(JunitError::UnknownRoot(other.to_string())),
    }
}

pub struct TestResultCollector {
    junit_path: PathBuf,
    weight: f64,
}

impl TestResultCollector {
    pub fn new(junit_path: impl Into<PathBuf>) -> Self {
        Self {
            junit_path: junit_path.into(),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    fn failure(&self, detail: String, error: String) -> ScoringResult {
        ScoringResult::new(
            MetricCategory::Tests,
            self.weight,
            0.0,
            0.0,
            details(json!({ "error": detail })),
        )
        .with_error(error)
    }

    fn score(&self, counts: JunitCounts) -> ScoringResult {
        if counts.total == 0 {
            return ScoringResult::new(
                MetricCategory::Tests,
                self.weight,
                0.0,
                0.0,
                details(json!({
                    "total": 0,
                    "passed": 0,
                    "failed": 0,
                    "errors": 0,
                    "skipped": counts.skipped,
                    "warning": "No tests found",
                })),
            )
            .with_error("No tests found in JUnit XML");
        }

        let passed = counts.passed();
        let pass_rate = passed as f64 / counts.total as f64 * 100.0;

        ScoringResult::new(
            MetricCategory::Tests,
            self.weight,
            pass_rate,
            pass_rate,
            details(json!({
                "total": counts.total,
                "passed": passed,
                "failed": counts.failures,
                "errors": counts.errors,
                "skipped": counts.skipped,
                "pass_rate": format!("{pass_rate:.1}%"),
            })),
        )
    }
}

#[async_trait]
impl MetricCollector for TestResultCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Tests
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn collect(&self) -> ScoringResult {
        let xml = match tokio::fs::read_to_string(&self.junit_path).await {
            Ok(xml) => xml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.failure(
                    "JUnit XML file not found".into(),
                    format!("File not found: {}", self.junit_path.display()),
                );
            }
            Err(e) => {
                return self.failure(
                    e.to_string(),
                    format!("Unexpected error collecting test results: {e}"),
                );
            }
        };

        match parse_junit(&xml) {
            Ok(counts) => {
                tracing::debug!(
                    total = counts.total,
                    failures = counts.failures,
                    errors = counts.errors,
                    "Parsed JUnit results"
                );
                self.score(counts)
            }
            Err(e @ JunitError::Xml(_)) => {
                self.failure(e.to_string(), format!("Failed to parse JUnit XML: {e}"))
            }
            Err(e @ (JunitError::UnknownRoot(_) | JunitError::Overflow { .. })) => {
                self.failure(e.to_string(), format!("Invalid JUnit XML: {e}"))
            }
            Err(e) => self.failure(
                e.to_string(),
                format!("Unexpected error collecting test results: {e}"),
            ),
        }
    }
}

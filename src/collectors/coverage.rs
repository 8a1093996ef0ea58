// src/collectors/coverage.rs — Cobertura XML coverage delta

use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;

use super::MetricCollector;
use crate::scoring::{details, MetricCategory, ScoringResult};

const DEFAULT_WEIGHT: f64 = 0.20;
const DEFAULT_TOLERANCE: f64 = 0.1;
const NEUTRAL_SCORE: f64 = 50.0;

/// Root-level rates of a Cobertura report, both in 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageRates {
    pub line_rate: f64,
    pub branch_rate: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("attribute {attr}=\"{value}\" is not a rate")]
    BadRate { attr: &'static str, value: String },
}

fn rate_attr(node: roxmltree::Node<'_, '_>, attr: &'static str) -> Result<f64, CoverageError> {
    match node.attribute(attr) {
        None => Ok(0.0),
        Some(value) => value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite())
            .ok_or_else(|| CoverageError::BadRate {
                attr,
                value: value.to_string(),
            }),
    }
}

pub fn parse_cobertura(xml: &str) -> Result<CoverageRates, CoverageError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    Ok(CoverageRates {
        line_rate: rate_attr(root, "line-rate")?,
        branch_rate: rate_attr(root, "branch-rate")?,
    })
}

/// Map a coverage delta (percentage points) to 0–100.
///
/// Smooth curve: 0 → 50, +5 → ~98, −5 → ~2.
pub fn normalize_delta(delta: f64) -> f64 {
    (50.0 + 50.0 * (delta / 2.5).tanh()).clamp(0.0, 100.0)
}

pub struct CoverageCollector {
    coverage_path: PathBuf,
    baseline_coverage: Option<f64>,
    tolerance: f64,
    weight: f64,
}

impl CoverageCollector {
    pub fn new(coverage_path: impl Into<PathBuf>) -> Self {
        Self {
            coverage_path: coverage_path.into(),
            baseline_coverage: None,
            tolerance: DEFAULT_TOLERANCE,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Baseline coverage percentage (0–100) to diff against.
    pub fn with_baseline(mut self, baseline: Option<f64>) -> Self {
        self.baseline_coverage = baseline;
        self
    }

    /// Deltas smaller than this (percentage points) count as no change.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    fn failure(&self, detail: String, error: String) -> ScoringResult {
        ScoringResult::new(
            MetricCategory::Coverage,
            self.weight,
            0.0,
            NEUTRAL_SCORE,
            details(json!({ "error": detail })),
        )
        .with_error(error)
    }

    fn score(&self, rates: CoverageRates) -> ScoringResult {
        let current = rates.line_rate * 100.0;
        let baseline = self.baseline_coverage.unwrap_or(current);

        let mut delta = current - baseline;
        if delta.abs() < self.tolerance {
            delta = 0.0;
        }

        ScoringResult::new(
            MetricCategory::Coverage,
            self.weight,
            delta,
            normalize_delta(delta),
            details(json!({
                "current_coverage": format!("{current:.2}%"),
                "baseline_coverage": format!("{baseline:.2}%"),
                "delta": format!("{delta:+.2}%"),
                "line_rate": format!("{:.2}", rates.line_rate),
                "branch_rate": format!("{:.2}", rates.branch_rate),
                "tolerance": format!("{}%", self.tolerance),
            })),
        )
    }
}

#[async_trait]
impl MetricCollector for CoverageCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::Coverage
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn collect(&self) -> ScoringResult {
        let xml = match tokio::fs::read_to_string(&self.coverage_path).await {
            Ok(xml) => xml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.failure(
                    "Coverage XML file not found".into(),
                    format!("File not found: {}", self.coverage_path.display()),
                );
            }
            Err(e) => {
                return self.failure(
                    e.to_string(),
                    format!("Unexpected error collecting coverage: {e}"),
                );
            }
        };

        match parse_cobertura(&xml) {
            Ok(rates) => self.score(rates),
            Err(e @ CoverageError::Xml(_)) => {
                self.failure(e.to_string(), format!("Failed to parse Cobertura XML: {e}"))
            }
            Err(e) => self.failure(
                e.to_string(),
                format!("Unexpected error collecting coverage: {e}"),
            ),
        }
    }
}

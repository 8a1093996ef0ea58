// src/scoring/engine.rs — Runs collectors and computes the PR verdict

use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::Path;

use super::{
    now_timestamp, MetricCategory, PRScore, ScoreStatus, ScoringConfig, ScoringResult,
    SECURITY_PENALTY, TEST_FAILURE_PENALTY,
};
use crate::collectors::MetricCollector;
use crate::infra::config::ReviewerConfig;
use crate::infra::errors::ReviewEvalError;

/// Orchestrates metric collection and score calculation.
///
/// Construction fails when the configured weights do not sum to 1.0, so an
/// engine that exists is always in a valid state.
pub struct ScoringEngine {
    config: ScoringConfig,
    collectors: Vec<Box<dyn MetricCollector>>,
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("config", &self.config)
            .field("collectors", &self.collectors.len())
            .finish()
    }
}

impl ScoringEngine {
    pub fn new(
        config: ScoringConfig,
        collectors: Vec<Box<dyn MetricCollector>>,
    ) -> Result<Self, ReviewEvalError> {
        if !config.validate_weights() {
            return Err(ReviewEvalError::InvalidWeights {
                total: config.weight_sum(),
            });
        }
        Ok(Self { config, collectors })
    }

    /// Build from the `scoring:` section of a reviewer.yaml file.
    pub fn from_config_file(
        path: &Path,
        collectors: Vec<Box<dyn MetricCollector>>,
    ) -> Result<Self, ReviewEvalError> {
        let config = ReviewerConfig::load_from(path)?.scoring.to_scoring_config();
        Self::new(config, collectors)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Run every collector concurrently and fold the results into a PRScore.
    pub async fn calculate_score(&self) -> PRScore {
        let results = join_all(self.collectors.iter().map(|c| c.collect())).await;

        let mut breakdown: BTreeMap<MetricCategory, ScoringResult> = BTreeMap::new();
        for result in results {
            if let Some(err) = &result.error_message {
                tracing::warn!(category = %result.category, "Collector degraded: {}", err);
            }
            breakdown.insert(result.category, result);
        }

        self.score_breakdown(breakdown)
    }

    /// Weighted sum, penalty scan and verdict for already-collected results.
    pub fn score_breakdown(&self, breakdown: BTreeMap<MetricCategory, ScoringResult>) -> PRScore {
        let weighted_score: f64 = breakdown
            .iter()
            .map(|(category, result)| result.normalized_score * self.config.weight_for(*category))
            .sum();

        let mut blocking_factors = Vec::new();
        let mut penalties = 0.0;

        for (category, result) in &breakdown {
            // A failed collection only lowers its own score; it never blocks.
            if result.is_error() {
                continue;
            }

            match category {
                MetricCategory::AiReview => {
                    let security = result.detail_f64("security_issues").unwrap_or(0.0);
                    if security > 0.0 {
                        penalties += self.config.penalty(SECURITY_PENALTY);
                        blocking_factors.push(format!(
                            "Security vulnerability detected ({} issue(s))",
                            security as u64
                        ));
                    }
                }
                MetricCategory::Tests => {
                    let failed = result.detail_f64("failed").unwrap_or(0.0);
                    let total = result.detail_f64("total").unwrap_or(0.0);
                    if total > 0.0 && failed == total {
                        penalties += self.config.penalty(TEST_FAILURE_PENALTY);
                        blocking_factors.push(format!(
                            "All tests failing ({}/{})",
                            failed as u64, total as u64
                        ));
                    }
                }
                _ => {}
            }
        }

        let total_score = (weighted_score - penalties).clamp(0.0, 100.0);
        let status = if total_score >= self.config.threshold && blocking_factors.is_empty() {
            ScoreStatus::Pass
        } else {
            ScoreStatus::Fail
        };

        tracing::info!(
            score = total_score,
            weighted = weighted_score,
            penalties,
            status = %status,
            "PR score calculated"
        );

        PRScore {
            total_score,
            status,
            threshold: self.config.threshold,
            blocking_factors,
            breakdown,
            timestamp: now_timestamp(),
        }
    }
}

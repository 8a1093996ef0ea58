// src/collectors/mod.rs — Metric collectors for PR scoring
//
// Each collector reads one evidentiary artifact (or runs one tool) and
// normalizes it to a 0–100 score. Collectors never fail: problems are
// reported through `ScoringResult::error_message` with a degraded score.

pub mod ai_review;
pub mod coverage;
pub mod static_analysis;
pub mod test_results;

use async_trait::async_trait;

use crate::scoring::{MetricCategory, ScoringResult};

pub use ai_review::AiReviewCollector;
pub use coverage::CoverageCollector;
pub use static_analysis::StaticAnalysisCollector;
pub use test_results::TestResultCollector;

#[async_trait]
pub trait MetricCollector: Send + Sync {
    fn category(&self) -> MetricCategory;

    fn weight(&self) -> f64;

    async fn collect(&self) -> ScoringResult;
}

// src/evaluator/multi_model.rs — Consensus review across a model roster
//
// Every roster entry is queried concurrently on the current task (full join,
// no spawning). Aggregation happens after the join, so nothing is shared
// between the in-flight queries.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use super::{
    default_models, match_expected_issues, GoldenTestCase, ModelConfig, ModelReviewResult,
    MultiModelResult,
};
use crate::infra::errors::ReviewEvalError;
use crate::provider::ModelGateway;

pub struct MultiModelEvaluator {
    gateway: ModelGateway,
    models: Vec<ModelConfig>,
    prompt_context: String,
}

impl MultiModelEvaluator {
    /// An empty `models` list selects the default roster.
    pub fn new(
        gateway: ModelGateway,
        prompt_context: impl Into<String>,
        models: Vec<ModelConfig>,
    ) -> Self {
        let models = if models.is_empty() {
            default_models()
        } else {
            models
        };
        Self {
            gateway,
            models,
            prompt_context: prompt_context.into(),
        }
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    /// Review with one model. Never fails: a gateway error becomes a failed
    /// result that missed every expected issue.
    pub async fn evaluate_single_model(
        &self,
        model: &ModelConfig,
        test_case: &GoldenTestCase,
    ) -> ModelReviewResult {
        match self
            .gateway
            .query(&model.model_id, &self.prompt_context, &test_case.code)
            .await
        {
            Ok(reply) => {
                let (matched_issues, missed_issues) =
                    match_expected_issues(&test_case.expected_issues, &reply.text);
                ModelReviewResult {
                    model_name: model.name.clone(),
                    model_id: model.model_id.clone(),
                    review_text: reply.text,
                    passed: missed_issues.is_empty(),
                    matched_issues,
                    missed_issues,
                    latency_ms: reply.latency_ms,
                }
            }
            Err(e) => {
                tracing::warn!(model = %model.model_id, test = %test_case.id, "Model review failed: {}", e);
                ModelReviewResult {
                    model_name: model.name.clone(),
                    model_id: model.model_id.clone(),
                    review_text: format!("Error: {e}"),
                    matched_issues: Vec::new(),
                    missed_issues: test_case.expected_issues.clone(),
                    passed: false,
                    latency_ms: 0.0,
                }
            }
        }
    }

    pub async fn evaluate_async(&self, test_case: &GoldenTestCase) -> MultiModelResult {
        let results = join_all(
            self.models
                .iter()
                .map(|model| self.evaluate_single_model(model, test_case)),
        )
        .await;

        let result = aggregate(test_case, results, self.models.len());
        tracing::info!(
            test = %result.test_id,
            passed = result.models_passed,
            total = result.total_models,
            consensus_passed = result.consensus_passed,
            "Multi-model evaluation complete"
        );
        result
    }

    /// Blocking form of [`evaluate_async`](Self::evaluate_async).
    ///
    /// Builds a private current-thread runtime. Must not be called from
    /// inside an async context.
    pub fn evaluate(&self, test_case: &GoldenTestCase) -> Result<MultiModelResult, ReviewEvalError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.evaluate_async(test_case)))
    }
}

/// Fold per-model results into consensus statistics.
///
/// Issue sets list issues in order of first appearance across `results`.
pub fn aggregate(
    test_case: &GoldenTestCase,
    results: Vec<ModelReviewResult>,
    total_models: usize,
) -> MultiModelResult {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for issue in results.iter().flat_map(|r| r.matched_issues.iter()) {
        let count = counts.entry(issue.as_str()).or_insert(0);
        if *count == 0 {
            order.push(issue.as_str());
        }
        *count += 1;
    }

    let majority_threshold = total_models / 2 + 1;
    let select = |keep: &dyn Fn(usize) -> bool| -> Vec<String> {
        order
            .iter()
            .filter(|issue| keep(counts[*issue]))
            .map(|issue| issue.to_string())
            .collect()
    };

    let consensus_issues = select(&|count| count >= majority_threshold);
    let unanimous_issues = select(&|count| count == total_models);
    let any_model_issues = select(&|_| true);

    let consensus_lower: HashSet<String> =
        consensus_issues.iter().map(|i| i.to_lowercase()).collect();
    let consensus_passed = test_case
        .expected_issues
        .iter()
        .all(|issue| consensus_lower.contains(&issue.to_lowercase()));

    let models_passed = results.iter().filter(|r| r.passed).count();

    MultiModelResult {
        test_id: test_case.id.clone(),
        model_results: results,
        consensus_issues,
        unanimous_issues,
        any_model_issues,
        consensus_passed,
        models_passed,
        total_models,
    }
}

fn issue_list(issues: &[String]) -> String {
    if issues.is_empty() {
        "None".to_string()
    } else {
        format!("{issues:?}")
    }
}

/// Render a multi-model result as a plain-text report.
pub fn format_multi_model_report(result: &MultiModelResult) -> String {
    let rule = "=".repeat(60);
    let thin = "-".repeat(40);
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "Test: {}", result.test_id);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "Pass Rate: {}/{} ({:.0}%)",
        result.models_passed,
        result.total_models,
        result.pass_rate() * 100.0
    );
    let _ = writeln!(
        out,
        "Consensus Passed: {}",
        if result.consensus_passed { "✓" } else { "✗" }
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Individual Model Results:");
    let _ = writeln!(out, "{thin}");
    for mr in &result.model_results {
        let status = if mr.passed { "✓" } else { "✗" };
        let _ = writeln!(out, "  {status} {} ({:.0}ms)", mr.model_name, mr.latency_ms);
        if !mr.matched_issues.is_empty() {
            let _ = writeln!(out, "     Caught: {}", mr.matched_issues.join(", "));
        }
        if !mr.missed_issues.is_empty() {
            let _ = writeln!(out, "     Missed: {}", mr.missed_issues.join(", "));
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Aggregated Findings:");
    let _ = writeln!(out, "{thin}");
    let _ = writeln!(
        out,
        "  Unanimous (all models): {}",
        issue_list(&result.unanimous_issues)
    );
    let _ = writeln!(
        out,
        "  Consensus (majority):   {}",
        issue_list(&result.consensus_issues)
    );
    let _ = writeln!(
        out,
        "  Any model found:        {}",
        issue_list(&result.any_model_issues)
    );

    out
}

// src/cli/score.rs — `review-eval score`

use anyhow::Context;
use std::path::PathBuf;

use super::ScoreArgs;
use crate::collectors::{
    AiReviewCollector, CoverageCollector, MetricCollector, StaticAnalysisCollector,
    TestResultCollector,
};
use crate::infra::config::ReviewerConfig;
use crate::scoring::report::format_summary;
use crate::scoring::{MetricCategory, ScoringConfig, ScoringEngine, COVERAGE_TOLERANCE};

const NO_INPUTS: &str =
    "No metrics specified. Provide at least one of: --junit, --coverage, --static-analysis, --ai-review";

/// Build a collector for every input that was supplied.
pub fn build_collectors(args: &ScoreArgs, config: &ScoringConfig) -> Vec<Box<dyn MetricCollector>> {
    let mut collectors: Vec<Box<dyn MetricCollector>> = Vec::new();

    if let Some(junit) = &args.junit {
        collectors.push(Box::new(
            TestResultCollector::new(junit).with_weight(config.weight_for(MetricCategory::Tests)),
        ));
    }

    if let Some(coverage) = &args.coverage {
        let mut collector = CoverageCollector::new(coverage)
            .with_baseline(args.baseline_coverage)
            .with_weight(config.weight_for(MetricCategory::Coverage));
        if let Some(tolerance) = config.tolerance(COVERAGE_TOLERANCE) {
            collector = collector.with_tolerance(tolerance);
        }
        collectors.push(Box::new(collector));
    }

    if args.static_analysis.is_some() || args.repo_root.is_some() {
        let paths = args.static_analysis.clone().unwrap_or_default();
        let repo_root = args.repo_root.clone().unwrap_or_else(|| PathBuf::from("."));
        collectors.push(Box::new(
            StaticAnalysisCollector::new(repo_root)
                .with_lint_results(paths.first().cloned())
                .with_typecheck_results(paths.get(1).cloned())
                .with_weight(config.weight_for(MetricCategory::StaticAnalysis)),
        ));
    }

    if let Some(ai_review) = &args.ai_review {
        collectors.push(Box::new(
            AiReviewCollector::from_path(ai_review)
                .with_weight(config.weight_for(MetricCategory::AiReview)),
        ));
    }

    collectors
}

/// Returns the process exit code.
pub async fn run_score(args: &ScoreArgs) -> anyhow::Result<i32> {
    let mut config = ReviewerConfig::load(args.config.as_deref())?
        .scoring
        .to_scoring_config();
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }

    let collectors = build_collectors(args, &config);
    if collectors.is_empty() {
        anyhow::bail!(NO_INPUTS);
    }

    let engine = ScoringEngine::new(config, collectors)?;
    let result = engine.calculate_score().await;

    if let Some(output) = &args.output {
        std::fs::write(output, result.to_json_pretty()?)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("Score saved to: {}", output.display());
    }

    println!("{}", format_summary(&result));

    if args.fail_on_error && !result.passed() {
        eprintln!("FAIL: Score below threshold or blocking factors present");
        return Ok(1);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_supplied_inputs_get_collectors() {
        let args = ScoreArgs {
            junit: Some("junit.xml".into()),
            ai_review: Some("ai.json".into()),
            ..Default::default()
        };
        let collectors = build_collectors(&args, &ScoringConfig::default());
        let categories: Vec<_> = collectors.iter().map(|c| c.category()).collect();
        assert_eq!(categories, vec![MetricCategory::Tests, MetricCategory::AiReview]);
        assert_eq!(collectors[0].weight(), 0.30);
    }

    #[test]
    fn test_repo_root_alone_enables_static_analysis() {
        let args = ScoreArgs {
            repo_root: Some(".".into()),
            ..Default::default()
        };
        let collectors = build_collectors(&args, &ScoringConfig::default());
        assert_eq!(collectors.len(), 1);
        assert_eq!(collectors[0].category(), MetricCategory::StaticAnalysis);
    }

    #[tokio::test]
    async fn test_no_inputs_is_an_error() {
        let err = run_score(&ScoreArgs::default()).await.unwrap_err();
        assert!(err.to_string().starts_with("No metrics specified"));
    }

    #[tokio::test]
    async fn test_fail_on_error_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let junit = dir.path().join("junit.xml");
        std::fs::write(&junit, r#"<testsuite tests="2" failures="2"/>"#).unwrap();
        let output = dir.path().join("score.json");

        let args = ScoreArgs {
            junit: Some(junit),
            output: Some(output.clone()),
            fail_on_error: true,
            ..Default::default()
        };
        assert_eq!(run_score(&args).await.unwrap(), 1);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(saved["status"], "FAIL");
        assert_eq!(saved["blocking_factors"][0], "All tests failing (2/2)");
    }

    #[tokio::test]
    async fn test_invalid_config_weights_abort() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("reviewer.yaml");
        std::fs::write(&config, "scoring:\n  weights:\n    tests: 0.9\n").unwrap();
        let args = ScoreArgs {
            config: Some(config),
            ai_review: Some(dir.path().join("none.json")),
            ..Default::default()
        };
        let err = run_score(&args).await.unwrap_err();
        assert!(err.to_string().contains("Weights must sum to 1.0"));
    }
}

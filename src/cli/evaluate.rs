// src/cli/evaluate.rs — `review-eval evaluate`

use anyhow::Context;
use std::sync::Arc;

use super::EvaluateArgs;
use crate::evaluator::golden::load_suite;
use crate::evaluator::{
    benchmark_models, default_models, format_multi_model_report, GoldenTestCase, ModelConfig,
    MultiModelEvaluator, MultiModelResult,
};
use crate::infra::config::ReviewerConfig;
use crate::infra::errors::ReviewEvalError;
use crate::provider::openrouter::OpenRouterProvider;
use crate::provider::retry::RetryProvider;
use crate::provider::ModelGateway;

/// `--benchmark` wins, then a roster from the config file, then the default.
pub fn select_roster(benchmark: bool, configured: Option<Vec<ModelConfig>>) -> Vec<ModelConfig> {
    if benchmark {
        return benchmark_models();
    }
    match configured {
        Some(models) if !models.is_empty() => models,
        _ => default_models(),
    }
}

/// Evaluate every case in order; each case fans out across the roster.
pub async fn evaluate_suite(
    evaluator: &MultiModelEvaluator,
    cases: &[GoldenTestCase],
) -> Vec<MultiModelResult> {
    let mut results = Vec::with_capacity(cases.len());
    for case in cases {
        let result = evaluator.evaluate_async(case).await;
        println!("{}", format_multi_model_report(&result));
        results.push(result);
    }
    results
}

fn write_results(args: &EvaluateArgs, results: &[MultiModelResult]) -> anyhow::Result<()> {
    if let Some(output) = &args.output {
        std::fs::write(output, serde_json::to_string_pretty(results)?)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("Results saved to: {}", output.display());
    }
    Ok(())
}

pub async fn run_evaluate(args: &EvaluateArgs) -> anyhow::Result<i32> {
    let config = ReviewerConfig::load(args.config.as_deref())?;
    let prompt = std::fs::read_to_string(&args.prompt)
        .with_context(|| format!("reading prompt {}", args.prompt.display()))?;
    let cases = load_suite(&args.suite)?;

    let provider = match OpenRouterProvider::from_config(&config.gateway) {
        Ok(provider) => provider,
        Err(e @ ReviewEvalError::MissingCredentials { .. }) => {
            tracing::warn!("{}; skipping AI review evaluation", e);
            write_results(args, &[])?;
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let gateway = ModelGateway::new(Arc::new(RetryProvider::new(Arc::new(provider))))
        .with_max_tokens(config.gateway.max_tokens);
    let roster = select_roster(args.benchmark, config.models);
    tracing::info!(
        cases = cases.len(),
        models = roster.len(),
        "Starting multi-model evaluation"
    );

    let evaluator = MultiModelEvaluator::new(gateway, prompt, roster);
    let results = evaluate_suite(&evaluator, &cases).await;

    let consensus_passed = results.iter().filter(|r| r.consensus_passed).count();
    println!(
        "Consensus passed: {consensus_passed}/{} test case(s)",
        results.len()
    );

    write_results(args, &results)?;
    Ok(0)
}

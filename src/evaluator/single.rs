// src/evaluator/single.rs — Single-model review evaluation

use super::{match_expected_issues, GoldenTestCase, ReviewResult};
use crate::infra::errors::ReviewEvalError;
use crate::provider::ModelGateway;

pub const DEFAULT_REVIEW_MODEL: &str = "anthropic/claude-sonnet-4";

/// Runs golden test cases against one model. Gateway errors propagate.
pub struct ReviewEvaluator {
    gateway: ModelGateway,
    prompt_context: String,
    model: String,
}

impl ReviewEvaluator {
    pub fn new(gateway: ModelGateway, prompt_context: impl Into<String>) -> Self {
        Self {
            gateway,
            prompt_context: prompt_context.into(),
            model: DEFAULT_REVIEW_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn evaluate(&self, test_case: &GoldenTestCase) -> Result<ReviewResult, ReviewEvalError> {
        let reply = self
            .gateway
            .query(&self.model, &self.prompt_context, &test_case.code)
            .await?;

        let (matched_issues, missed_issues) =
            match_expected_issues(&test_case.expected_issues, &reply.text);

        Ok(ReviewResult {
            test_id: test_case.id.clone(),
            passed: missed_issues.is_empty(),
            review_text: reply.text,
            matched_issues,
            missed_issues,
        })
    }
}

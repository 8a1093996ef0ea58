// src/infra/config.rs — reviewer.yaml loading (serde_yml)
//
// Every key is optional. Missing scoring fields fall back to the documented
// defaults; a `models` list replaces the default roster.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::evaluator::ModelConfig;
use crate::infra::errors::ReviewEvalError;
use crate::provider::gateway::DEFAULT_MAX_TOKENS;
use crate::provider::openrouter::DEFAULT_BASE_URL;
use crate::scoring::{MetricCategory, ScoringConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerConfig {
    #[serde(default)]
    pub scoring: ScoringSection,

    #[serde(default)]
    pub models: Option<Vec<ModelConfig>>,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringSection {
    pub threshold: Option<f64>,
    #[serde(default)]
    pub weights: WeightsSection,
    pub critical_penalties: Option<BTreeMap<String, f64>>,
    pub tolerance: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightsSection {
    pub tests: Option<f64>,
    pub coverage: Option<f64>,
    pub static_analysis: Option<f64>,
    pub ai_review: Option<f64>,
}

impl ScoringSection {
    /// Resolve into a full ScoringConfig. Weights fall back per key; penalty
    /// and tolerance maps replace the defaults wholesale when present.
    pub fn to_scoring_config(&self) -> ScoringConfig {
        let defaults = ScoringConfig::default();
        let weight = |value: Option<f64>, category: MetricCategory| {
            value.unwrap_or_else(|| defaults.weight_for(category))
        };

        let weights = BTreeMap::from([
            (
                MetricCategory::Tests,
                weight(self.weights.tests, MetricCategory::Tests),
            ),
            (
                MetricCategory::Coverage,
                weight(self.weights.coverage, MetricCategory::Coverage),
            ),
            (
                MetricCategory::StaticAnalysis,
                weight(self.weights.static_analysis, MetricCategory::StaticAnalysis),
            ),
            (
                MetricCategory::AiReview,
                weight(self.weights.ai_review, MetricCategory::AiReview),
            ),
        ]);

        ScoringConfig {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            weights,
            critical_penalties: self
                .critical_penalties
                .clone()
                .unwrap_or(defaults.critical_penalties),
            tolerance: self.tolerance.clone().unwrap_or(defaults.tolerance),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ReviewEvalError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ReviewEvalError::MissingCredentials {
                provider: "openrouter".into(),
                env_var: self.api_key_env.clone(),
            }),
        }
    }
}

impl ReviewerConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ReviewEvalError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(content)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ReviewEvalError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReviewEvalError::Config(
            format!("cannot read {}: {e}", path.display()),
        ))?;
        Self::from_yaml_str(&content)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ReviewEvalError> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ReviewerConfig::from_yaml_str("").unwrap();
        let scoring = config.scoring.to_scoring_config();
        assert_eq!(scoring.threshold, 80.0);
        assert!(scoring.validate_weights());
        assert!(config.models.is_none());
        assert_eq!(config.gateway.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.gateway.max_tokens, 2048);
    }

    #[test]
    fn test_partial_weights_fall_back_per_key() {
        let yaml = r#"
scoring:
  threshold: 70
  weights:
    tests: 0.4
    ai_review: 0.2
"#;
        let scoring = ReviewerConfig::from_yaml_str(yaml)
            .unwrap()
            .scoring
            .to_scoring_config();
        assert_eq!(scoring.threshold, 70.0);
        assert_eq!(scoring.weight_for(MetricCategory::Tests), 0.4);
        assert_eq!(scoring.weight_for(MetricCategory::Coverage), 0.2);
        assert_eq!(scoring.weight_for(MetricCategory::StaticAnalysis), 0.2);
        assert_eq!(scoring.weight_for(MetricCategory::AiReview), 0.2);
    }

    #[test]
    fn test_penalty_map_replaces_defaults() {
        let yaml = r#"
scoring:
  critical_penalties:
    security_vulnerability: 40
  tolerance:
    coverage_delta: 0.5
"#;
        let scoring = ReviewerConfig::from_yaml_str(yaml)
            .unwrap()
            .scoring
            .to_scoring_config();
        assert_eq!(scoring.penalty("security_vulnerability"), 40.0);
        assert_eq!(scoring.penalty("critical_test_failure"), 0.0);
        assert_eq!(scoring.tolerance("coverage_delta"), Some(0.5));
    }

    #[test]
    fn test_models_and_gateway_sections() {
        let yaml = r#"
models:
  - name: GPT-4o
    model_id: openai/gpt-4o
  - name: Llama
    model_id: meta-llama/llama-3.3-70b-instruct
    weight: 0.6
gateway:
  base_url: http://localhost:8080/v1
  api_key_env: LOCAL_GATEWAY_KEY
"#;
        let config = ReviewerConfig::from_yaml_str(yaml).unwrap();
        let models = config.models.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].provider, "openrouter");
        assert_eq!(models[0].weight, 1.0);
        assert_eq!(models[1].weight, 0.6);
        assert_eq!(config.gateway.base_url, "http://localhost:8080/v1");
        assert_eq!(config.gateway.api_key_env, "LOCAL_GATEWAY_KEY");
        assert_eq!(config.gateway.timeout_secs, 120);
    }

    #[test]
    fn test_missing_api_key_env() {
        let gateway = GatewayConfig {
            api_key_env: "REVIEW_EVAL_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(matches!(
            gateway.api_key(),
            Err(ReviewEvalError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ReviewerConfig::load_from(Path::new("/nonexistent/reviewer.yaml"));
        assert!(matches!(result, Err(ReviewEvalError::Config(_))));
    }

    #[test]
    fn test_load_without_path_is_default() {
        let config = ReviewerConfig::load(None).unwrap();
        assert!(config.scoring.threshold.is_none());
    }
}

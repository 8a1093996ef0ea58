// src/infra/errors.rs — Error types for review-eval

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewEvalError {
    // Gateway errors (some retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Request to '{provider}' timed out: {message}")]
    Timeout { provider: String, message: String },

    #[error("No credentials for '{provider}'. Set {env_var}.")]
    MissingCredentials { provider: String, env_var: String },

    // Scoring configuration (fatal)
    #[error("Weights must sum to 1.0, got {total:.2}")]
    InvalidWeights { total: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    // Input artifacts
    #[error("Artifact '{path}': {message}")]
    Artifact { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReviewEvalError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ReviewEvalError::Provider {
                retriable: true,
                ..
            } | ReviewEvalError::RateLimited { .. }
                | ReviewEvalError::Timeout { .. }
        )
    }
}

// src/provider/embeddings.rs — Batched embedding client with retry
//
// Only the transport lives here; chunking and vector storage belong to
// whatever consumes the vectors.

use std::time::Duration;

use super::openrouter::{classify_status, classify_transport, retry_after_secs, DEFAULT_BASE_URL};
use super::retry::{with_retry, RetryPolicy};
use crate::infra::errors::ReviewEvalError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "qwen/qwen3-embedding-8b";
const DEFAULT_BATCH_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const PROVIDER_ID: &str = "openrouter-embeddings";

/// Output dimension for known embedding models.
pub fn model_dimension(model: &str) -> usize {
    match model {
        "qwen/qwen3-embedding-8b" => 4096,
        "openai/text-embedding-3-small" => 1536,
        "openai/text-embedding-3-large" => 3072,
        _ => 4096,
    }
}

pub struct EmbeddingClient {
    api_key: String,
    model: String,
    base_url: String,
    batch_size: usize,
    policy: RetryPolicy,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            policy: RetryPolicy::default(),
            client,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        model_dimension(&self.model)
    }

    /// Embed every text, preserving input order.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ReviewEvalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_key()?;

        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let label = format!("embed:{}", self.model);
            let vectors =
                with_retry(&self.policy, &label, || self.embed_batch(batch)).await?;
            out.extend(vectors);
        }
        Ok(out)
    }

    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ReviewEvalError> {
        let mut vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| ReviewEvalError::Provider {
            provider: PROVIDER_ID.into(),
            message: "empty embedding response".into(),
            retriable: false,
        })
    }

    fn ensure_key(&self) -> Result<(), ReviewEvalError> {
        if self.api_key.is_empty() {
            return Err(ReviewEvalError::MissingCredentials {
                provider: PROVIDER_ID.into(),
                env_var: "OPENROUTER_API_KEY".into(),
            });
        }
        Ok(())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ReviewEvalError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| classify_transport(PROVIDER_ID, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(PROVIDER_ID, status, retry_after, body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| classify_transport(PROVIDER_ID, e))?;
        parse_embeddings(&body)
    }
}

fn parse_embeddings(body: &serde_json::Value) -> Result<Vec<Vec<f32>>, ReviewEvalError> {
    let data = body["data"]
        .as_array()
        .ok_or_else(|| ReviewEvalError::Provider {
            provider: PROVIDER_ID.into(),
            message: "response has no `data` array".into(),
            retriable: false,
        })?;

    Ok(data
        .iter()
        .map(|item| {
            item["embedding"]
                .as_array()
                .map(|v| v.iter().filter_map(|x| x.as_f64()).map(|x| x as f32).collect())
                .unwrap_or_default()
        })
        .collect())
}

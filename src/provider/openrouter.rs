// src/provider/openrouter.rs — OpenAI-compatible chat-completion client
//
// Talks to OpenRouter by default; any endpoint that speaks the OpenAI
// `/chat/completions` dialect works when `base_url` is overridden.

use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, TokenUsage};
use crate::infra::config::GatewayConfig;
use crate::infra::errors::ReviewEvalError;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterProvider {
    id_str: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            id_str: "openrouter".into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build a client from gateway settings, reading the key from the
    /// configured environment variable.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ReviewEvalError> {
        let api_key = config.api_key()?;
        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Map a non-success HTTP status to the error taxonomy used by retry.
pub(crate) fn classify_status(
    provider: &str,
    status: reqwest::StatusCode,
    retry_after_secs: Option<u64>,
    body: String,
) -> ReviewEvalError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ReviewEvalError::RateLimited {
            provider: provider.to_string(),
            retry_after_ms: retry_after_secs.unwrap_or(0).saturating_mul(1000),
        };
    }
    ReviewEvalError::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {status}: {body}"),
        retriable: status.is_server_error(),
    }
}

/// Map a transport failure. Timeouts and connect failures are transient.
pub(crate) fn classify_transport(provider: &str, e: reqwest::Error) -> ReviewEvalError {
    if e.is_timeout() || e.is_connect() {
        return ReviewEvalError::Timeout {
            provider: provider.to_string(),
            message: e.to_string(),
        };
    }
    ReviewEvalError::Provider {
        provider: provider.to_string(),
        message: e.to_string(),
        retriable: false,
    }
}

pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub(crate) fn build_chat_body(request: &ChatRequest) -> serde_json::Value {
    let mut msgs = Vec::new();
    if let Some(system) = &request.system {
        msgs.push(serde_json::json!({"role": Role::System.as_str(), "content": system}));
    }
    for m in &request.messages {
        msgs.push(serde_json::json!({
            "role": m.role.as_str(),
            "content": m.content,
        }));
    }

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": msgs,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    body
}

pub(crate) fn parse_chat_response(resp: &serde_json::Value) -> ChatResponse {
    let content = resp["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    ChatResponse { content, usage }
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ReviewEvalError> {
        let body = build_chat_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(
                "User-Agent",
                format!("review-eval/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&self.id_str, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_status(&self.id_str, status, retry_after, error_body));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| classify_transport(&self.id_str, e))?;

        Ok(parse_chat_response(&resp))
    }
}

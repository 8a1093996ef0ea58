// src/provider/gateway.rs — One review request per (model, code) pair

use std::sync::Arc;
use std::time::Instant;

use super::{ChatRequest, Message, ModelProvider};
use crate::infra::errors::ReviewEvalError;

pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Wrap code in the fixed review instruction sent as the user turn.
pub fn review_message(code: &str) -> String {
    format!("Review this code for issues:\n\n```\n{code}\n```")
}

/// Review text plus wall-clock latency of the call.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub text: String,
    pub latency_ms: f64,
}

/// Thin client that issues a single chat completion for a code review.
///
/// Errors propagate; evaluators decide whether to turn them into failed
/// results.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn ModelProvider>,
    max_tokens: u32,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn query(
        &self,
        model_id: &str,
        system_prompt: &str,
        code: &str,
    ) -> Result<GatewayReply, ReviewEvalError> {
        let start = Instant::now();
        let response = self
            .provider
            .chat(ChatRequest {
                model: model_id.to_string(),
                messages: vec![Message::user(review_message(code))],
                max_tokens: Some(self.max_tokens),
                system: Some(system_prompt.to_string()),
            })
            .await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            model = model_id,
            latency_ms = latency_ms as u64,
            tokens = response.usage.total(),
            "Model review received"
        );

        Ok(GatewayReply {
            text: response.content,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, Role};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingProvider {
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ModelProvider for RecordingProvider {
        fn id(&self) -> &str {
            "recording"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ReviewEvalError> {
            self.seen.lock().unwrap().push(request);
            Ok(ChatResponse {
                content: "looks fine".into(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_review_message_template() {
        assert_eq!(
            review_message("x = 1"),
            "Review this code for issues:\n\n```\nx = 1\n```"
        );
    }

    #[tokio::test]
    async fn test_query_sends_system_and_user_turns() {
        let provider = Arc::new(RecordingProvider {
            seen: Mutex::new(Vec::new()),
        });
        let gateway = ModelGateway::new(provider.clone());

        let reply = gateway
            .query("openai/gpt-4o", "Be strict", "print(1)")
            .await
            .unwrap();
        assert_eq!(reply.text, "looks fine");
        assert!(reply.latency_ms >= 0.0);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "openai/gpt-4o");
        assert_eq!(seen[0].system.as_deref(), Some("Be strict"));
        assert_eq!(seen[0].max_tokens, Some(DEFAULT_MAX_TOKENS));
        assert_eq!(seen[0].messages[0].role, Role::User);
        assert!(seen[0].messages[0].content.contains("print(1)"));
    }
}

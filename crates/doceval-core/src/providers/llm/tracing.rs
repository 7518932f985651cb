use super::{InvokeOptions, LlmClient};
use crate::errors::InvokeError;
use crate::model::{ConversationPlan, LlmResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Wraps a client in an `llm.invoke` span carrying model, latency and token usage.
pub struct TracingLlmClient {
    inner: Arc<dyn LlmClient>,
}

impl TracingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for TracingLlmClient {
    async fn invoke(
        &self,
        plan: &ConversationPlan,
        options: &InvokeOptions,
    ) -> Result<LlmResponse, InvokeError> {
        let span = info_span!(
            "llm.invoke",
            "llm.provider" = self.inner.provider_name(),
            "llm.request.model" = options.model.as_str(),
            "llm.request.messages" = plan.messages.len(),
            "llm.response.model" = tracing::field::Empty,
            "llm.usage.input_tokens" = tracing::field::Empty,
            "llm.usage.output_tokens" = tracing::field::Empty,
            "llm.duration_ms" = tracing::field::Empty,
            "error" = tracing::field::Empty,
            "error.message" = tracing::field::Empty
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.invoke(plan, options).await;
            let span = tracing::Span::current();
            span.record("llm.duration_ms", start.elapsed().as_millis() as u64);

            match &result {
                Ok(resp) => {
                    span.record("llm.response.model", resp.model.as_str());
                    if let Some(usage) = &resp.usage {
                        if let Some(i) = usage.prompt_tokens {
                            span.record("llm.usage.input_tokens", i);
                        }
                        if let Some(o) = usage.completion_tokens {
                            span.record("llm.usage.output_tokens", o);
                        }
                    }
                    tracing::debug!(chars = resp.content.len(), "llm response received");
                }
                Err(e) => {
                    span.record("error", true);
                    span.record("error.message", e.to_string().as_str());
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatMessage, ChatRole, SystemSource};
    use crate::providers::llm::fake::FakeClient;

    struct TimeoutClient;

    #[async_trait]
    impl LlmClient for TimeoutClient {
        async fn invoke(
            &self,
            _plan: &ConversationPlan,
            options: &InvokeOptions,
        ) -> Result<LlmResponse, InvokeError> {
            Err(InvokeError::Timeout(options.timeout))
        }

        fn provider_name(&self) -> &'static str {
            "timeout"
        }
    }

    fn plan() -> ConversationPlan {
        ConversationPlan {
            messages: vec![ChatMessage::new(ChatRole::User, "hi")],
            system_source: SystemSource::None,
        }
    }

    #[tokio::test]
    async fn passes_through_success() {
        let client = TracingLlmClient::new(Arc::new(FakeClient::new().with_response("ok")));
        let resp = client
            .invoke(&plan(), &InvokeOptions::new("m"))
            .await
            .unwrap();
        assert_eq!(resp.content, "ok");
        assert_eq!(client.provider_name(), "fake");
    }

    #[tokio::test]
    async fn passes_through_errors_unchanged() {
        let client = TracingLlmClient::new(Arc::new(TimeoutClient));
        let err = client
            .invoke(&plan(), &InvokeOptions::new("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Timeout(_)));
    }
}

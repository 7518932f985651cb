pub mod fake;
pub mod openai;
pub mod tracing;

use crate::errors::InvokeError;
use crate::model::{ConversationPlan, LlmResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Per-call settings handed to an adapter alongside the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Adapters must fail with [`InvokeError::Timeout`] once this elapses.
    pub timeout: Duration,
}

impl InvokeOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(
        &self,
        plan: &ConversationPlan,
        options: &InvokeOptions,
    ) -> Result<LlmResponse, InvokeError>;

    fn provider_name(&self) -> &'static str;
}

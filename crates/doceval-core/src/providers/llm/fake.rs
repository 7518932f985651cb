use super::{InvokeOptions, LlmClient};
use crate::errors::InvokeError;
use crate::model::{ChatRole, ConversationPlan, LlmResponse, Usage};
use async_trait::async_trait;

/// Offline client for dry runs and tests.
///
/// Without a fixed response it answers with a small JSON analysis built from
/// the user message, so the whole pipeline can be exercised without a network.
#[derive(Debug, Default)]
pub struct FakeClient {
    fixed_response: Option<String>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }
}

fn synthesize(plan: &ConversationPlan) -> String {
    let user = plan
        .message(ChatRole::User)
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let document = user.rsplit("Document:\n").next().unwrap_or(user);
    let key_points: Vec<String> = document
        .split_whitespace()
        .filter(|w| w.len() > 4)
        .take(3)
        .map(str::to_string)
        .collect();
    let summary: String = document.chars().take(120).collect();
    serde_json::json!({
        "summary": summary.trim(),
        "key_points": key_points,
        "confidence": 0.5,
    })
    .to_string()
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn invoke(
        &self,
        plan: &ConversationPlan,
        options: &InvokeOptions,
    ) -> Result<LlmResponse, InvokeError> {
        let content = self
            .fixed_response
            .clone()
            .unwrap_or_else(|| synthesize(plan));
        let prompt_chars: usize = plan.messages.iter().map(|m| m.content.len()).sum();

        Ok(LlmResponse {
            usage: Some(Usage {
                prompt_tokens: Some((prompt_chars / 4) as u64),
                completion_tokens: Some((content.len() / 4) as u64),
                total_tokens: Some(((prompt_chars + content.len()) / 4) as u64),
            }),
            content,
            provider: "fake".to_string(),
            model: options.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::with_document;
    use crate::extract::extract;
    use crate::model::{ChatMessage, SystemSource};

    #[tokio::test]
    async fn synthesized_answer_is_json() {
        let plan = ConversationPlan {
            messages: vec![ChatMessage::new(
                ChatRole::User,
                with_document("Summarize.", "Quarterly revenue increased strongly"),
            )],
            system_source: SystemSource::None,
        };
        let resp = FakeClient::new()
            .invoke(&plan, &InvokeOptions::new("fake-model"))
            .await
            .unwrap();
        let v = extract(&resp.content);
        assert_eq!(v["key_points"][0], "Quarterly");
        assert_eq!(resp.model, "fake-model");
    }

    #[tokio::test]
    async fn fixed_response_wins() {
        let plan = ConversationPlan {
            messages: vec![],
            system_source: SystemSource::None,
        };
        let resp = FakeClient::new()
            .with_response("hello")
            .invoke(&plan, &InvokeOptions::new("m"))
            .await
            .unwrap();
        assert_eq!(resp.content, "hello");
    }
}

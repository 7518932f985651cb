use super::{InvokeOptions, LlmClient};
use crate::errors::InvokeError;
use crate::model::{ConversationPlan, LlmResponse, Usage};
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and API-compatible servers
/// (vLLM, Ollama's `/v1`, LM Studio, ...).
pub struct OpenAIClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

pub(crate) fn request_body(plan: &ConversationPlan, options: &InvokeOptions) -> serde_json::Value {
    json!({
        "model": options.model,
        "messages": plan.messages,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    })
}

pub(crate) fn parse_response(
    json: &serde_json::Value,
    model: &str,
) -> Result<LlmResponse, InvokeError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| InvokeError::MalformedResponse("missing choices[0].message.content".into()))?
        .to_string();

    let usage = json.get("usage").map(|u| Usage {
        prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()),
        completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()),
        total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()),
    });

    Ok(LlmResponse {
        content,
        provider: "openai".to_string(),
        model: json
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(model)
            .to_string(),
        usage,
        meta: json!({ "id": json.get("id") }),
    })
}

fn map_reqwest(e: reqwest::Error, options: &InvokeOptions) -> InvokeError {
    if e.is_timeout() {
        InvokeError::Timeout(options.timeout)
    } else {
        InvokeError::Transport(e.to_string())
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn invoke(
        &self,
        plan: &ConversationPlan,
        options: &InvokeOptions,
    ) -> Result<LlmResponse, InvokeError> {
        let mut req = self
            .client
            .post(self.endpoint())
            .timeout(options.timeout)
            .header("Content-Type", "application/json")
            .json(&request_body(plan, options));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| map_reqwest(e, options))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InvokeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                InvokeError::Timeout(options.timeout)
            } else {
                InvokeError::MalformedResponse(e.to_string())
            }
        })?;
        parse_response(&json, &options.model)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

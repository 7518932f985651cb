use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Conversational role a prompt fragment was authored for.
///
/// The role is derived from the fragment's file name prefix; anything without a
/// recognised prefix is a self-contained `Legacy` prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    System,
    User,
    Assistant,
    Legacy,
}

impl PromptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Legacy => "legacy",
        }
    }

    /// Roles that start a test case. System and assistant fragments only ever
    /// join a conversation through correlation.
    pub fn is_active(self) -> bool {
        matches!(self, Self::User | Self::Legacy)
    }
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptUnit {
    pub id: String,
    pub role: PromptRole,
    /// Prefix-stripped identifier shared by fragments of one prompt family.
    pub base_name: String,
    pub content: String,
}

impl PromptUnit {
    /// Builds a unit from its identifier, classifying the role by prefix.
    pub fn from_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        let (role, base_name) = classify_prompt_id(&id);
        Self {
            base_name: base_name.to_string(),
            id,
            role,
            content: content.into(),
        }
    }
}

const ROLE_PREFIXES: [(&str, PromptRole); 3] = [
    ("system_", PromptRole::System),
    ("user_", PromptRole::User),
    ("assistant_", PromptRole::Assistant),
];

/// Splits a prompt identifier into its role and base name.
///
/// `system_summary` → (`System`, `summary`); `summary` → (`Legacy`, `summary`).
pub fn classify_prompt_id(id: &str) -> (PromptRole, &str) {
    for (prefix, role) in ROLE_PREFIXES {
        if let Some(rest) = id.strip_prefix(prefix) {
            return (role, rest);
        }
    }
    (PromptRole::Legacy, id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub id: String,
    pub content: String,
}

/// One cell of the {model × prompt × document} cross-product.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub model: String,
    pub prompt: Arc<PromptUnit>,
    pub document: Arc<DocumentUnit>,
}

impl TestCase {
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.model, self.prompt.id, self.document.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Where the system slot of a conversation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemSource {
    /// A system fragment with the same base name.
    Exact(String),
    /// The first system fragment in the corpus, borrowed from another family.
    Fallback(String),
    /// Built-in generic system message.
    Default,
    /// Legacy prompts carry no system message.
    None,
}

/// Ordered, role-tagged messages submitted to a model for one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPlan {
    pub messages: Vec<ChatMessage>,
    pub system_source: SystemSource,
}

impl ConversationPlan {
    pub fn message(&self, role: ChatRole) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.role == role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

/// Raw model output as returned by a provider, and as stored in the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeMetrics {
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
    pub overall: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl QuantitativeMetrics {
    /// Zeroed metrics carrying a single error; what an evaluator returns when it
    /// cannot score at all.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitativeFeedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub quantitative: QuantitativeMetrics,
    pub qualitative: QualitativeFeedback,
}

/// Scored outcome of one successfully completed test case. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub prompt_id: String,
    pub prompt_role: PromptRole,
    pub prompt_base_name: String,
    pub document_id: String,
    pub quantitative: QuantitativeMetrics,
    pub qualitative: QualitativeFeedback,
    pub parsed_response: serde_json::Value,
    pub cached: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

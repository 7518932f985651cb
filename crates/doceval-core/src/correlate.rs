//! Role correlation: assembling a conversation from prompt fragments that share
//! a base name.
//!
//! Slot policy:
//! - legacy prompts become a single user message (prompt + document);
//! - user prompts collect the first `system`, `user` and `assistant` fragment
//!   with the same base name, each with the document appended;
//! - a missing system slot borrows the first system fragment anywhere in the
//!   corpus, and only falls back to [`DEFAULT_SYSTEM_PROMPT`] when the corpus
//!   has none at all;
//! - a missing user slot uses [`DEFAULT_USER_INSTRUCTION`].
//!
//! The cross-family borrow is long-standing behavior that existing result sets
//! depend on. It is logged at info level every time it fires.

use crate::corpus::PromptCorpus;
use crate::model::{
    ChatMessage, ChatRole, ConversationPlan, DocumentUnit, PromptRole, PromptUnit, SystemSource,
};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert document analyst. \
Read the provided document carefully and answer with a single JSON object.";

pub const DEFAULT_USER_INSTRUCTION: &str =
    "Analyze the following document and report your findings as JSON.";

/// Joins a fragment with the document under analysis.
pub fn with_document(content: &str, document: &str) -> String {
    format!("{}\n\n---\nDocument:\n{}", content.trim_end(), document)
}

/// Builds the conversation for `active` against `document`.
pub fn build_plan(
    active: &PromptUnit,
    corpus: &PromptCorpus,
    document: &DocumentUnit,
) -> ConversationPlan {
    match active.role {
        PromptRole::Legacy => ConversationPlan {
            messages: vec![ChatMessage::new(
                ChatRole::User,
                with_document(&active.content, &document.content),
            )],
            system_source: SystemSource::None,
        },
        PromptRole::User => correlate_user(active, corpus, document),
        PromptRole::System | PromptRole::Assistant => {
            // Not produced by the case generator; treat the fragment as a legacy prompt.
            tracing::warn!(
                prompt = %active.id,
                role = %active.role,
                "non-active prompt used as test prompt; sending as single user message"
            );
            ConversationPlan {
                messages: vec![ChatMessage::new(
                    ChatRole::User,
                    with_document(&active.content, &document.content),
                )],
                system_source: SystemSource::None,
            }
        }
    }
}

fn correlate_user(
    active: &PromptUnit,
    corpus: &PromptCorpus,
    document: &DocumentUnit,
) -> ConversationPlan {
    let mut system: Option<&PromptUnit> = None;
    let mut user: Option<&PromptUnit> = None;
    let mut assistant: Option<&PromptUnit> = None;

    for unit in corpus.iter().filter(|u| u.base_name == active.base_name) {
        let slot = match unit.role {
            PromptRole::System => &mut system,
            PromptRole::User => &mut user,
            PromptRole::Assistant => &mut assistant,
            PromptRole::Legacy => continue,
        };
        if slot.is_none() {
            *slot = Some(unit);
        }
    }

    let (system_content, system_source) = match system {
        Some(unit) => (
            with_document(&unit.content, &document.content),
            SystemSource::Exact(unit.id.clone()),
        ),
        None => match corpus.iter().find(|u| u.role == PromptRole::System) {
            Some(unit) => {
                tracing::info!(
                    prompt = %active.id,
                    fallback = %unit.id,
                    "no system prompt for this family; borrowing first system prompt in corpus"
                );
                (
                    with_document(&unit.content, &document.content),
                    SystemSource::Fallback(unit.id.clone()),
                )
            }
            None => {
                tracing::info!(prompt = %active.id, "no system prompts in corpus; using default");
                (DEFAULT_SYSTEM_PROMPT.to_string(), SystemSource::Default)
            }
        },
    };

    let user_content = match user {
        Some(unit) => with_document(&unit.content, &document.content),
        None => {
            tracing::info!(prompt = %active.id, "no user prompt for this family; using default");
            with_document(DEFAULT_USER_INSTRUCTION, &document.content)
        }
    };

    let mut messages = vec![
        ChatMessage::new(ChatRole::System, system_content),
        ChatMessage::new(ChatRole::User, user_content),
    ];
    if let Some(unit) = assistant {
        messages.push(ChatMessage::new(
            ChatRole::Assistant,
            with_document(&unit.content, &document.content),
        ));
    }

    ConversationPlan {
        messages,
        system_source,
    }
}

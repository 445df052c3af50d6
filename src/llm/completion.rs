//! Completion request shape and the collaborator trait.

use crate::conversation::{Role, Turn};
use crate::error::LlmError;

use serde::{Deserialize, Serialize};

/// One role-tagged message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<Turn> for ChatMessage {
    fn from(turn: Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// System message first, then stored history, then the new user message.
    pub fn compose(
        model: impl Into<String>,
        temperature: f32,
        system_message: &str,
        history: Vec<Turn>,
        user_message: &str,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(Role::System, system_message));
        messages.extend(history.into_iter().map(ChatMessage::from));
        messages.push(ChatMessage::new(Role::User, user_message));

        Self {
            model: model.into(),
            temperature,
            messages,
        }
    }
}

/// Anything that turns a message list into generated text.
pub trait ChatCompletion: Send + Sync + 'static {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = std::result::Result<String, LlmError>> + Send;
}

//! UI-agnostic chat state types
//!
//! The conversation is an explicit value owned by the front end. Provider
//! calls borrow it and hand back a new value on success; nothing here is
//! global or persisted.

use serde::{Deserialize, Serialize};

use crate::ai::ProviderAdapter;
use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Please provide clear, concise, and accurate responses.";

/// A chat message in the AI conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    /// Label used when a conversation is flattened into a plain prompt.
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::System => "System",
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        }
    }
}

/// Ordered user/assistant turns of one chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages to send to a provider: the optional system prompt followed by
    /// the history. A blank system prompt is dropped.
    pub fn to_request(&self, system_prompt: Option<&str>) -> Vec<ChatMessage> {
        let mut request = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
            request.push(ChatMessage::system(prompt));
        }
        request.extend(self.messages.iter().cloned());
        request
    }

    /// Sends `prompt` as the next user turn.
    ///
    /// On success returns the conversation extended with the user turn and the
    /// assistant's reply. On failure `self` is untouched, so the caller can
    /// retry with the same history.
    pub async fn exchange(
        &self,
        adapter: &ProviderAdapter,
        config: &ProviderConfig,
        system_prompt: Option<&str>,
        prompt: &str,
    ) -> Result<Conversation, ProviderError> {
        let mut next = self.clone();
        next.push(ChatMessage::user(prompt));

        let request = next.to_request(system_prompt);
        let reply = adapter.complete(&request, config).await?;

        next.push(ChatMessage::assistant(reply));
        Ok(next)
    }
}

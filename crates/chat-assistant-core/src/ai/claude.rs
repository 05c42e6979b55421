use serde::{Deserialize, Serialize};

use super::{non_empty, ChatBackend, WireRequest, MAX_TOKENS};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::{ChatMessage, ChatRole};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

/// Anthropic messages API. System turns move to the top-level `system` field.
#[derive(Clone)]
pub struct ClaudeApi {
    base_url: String,
}

impl ClaudeApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Splits system content from the turns. Multiple system messages are joined
/// with a blank line; blank system content yields `None`.
fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<ClaudeMessage<'_>>) {
    let mut system = Vec::new();
    let mut turns = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            ChatRole::System => {
                if !message.content.trim().is_empty() {
                    system.push(message.content.as_str());
                }
            }
            role => turns.push(ClaudeMessage {
                role: role.as_str(),
                content: &message.content,
            }),
        }
    }

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, turns)
}

impl ChatBackend for ClaudeApi {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<WireRequest, ProviderError> {
        let (system, turns) = split_system(messages);
        // The messages API needs at least one user/assistant turn.
        if turns.is_empty() {
            return Err(ProviderError::EmptyConversation);
        }
        let request = ClaudeRequest {
            model: &config.model,
            max_tokens: MAX_TOKENS,
            messages: turns,
            system,
        };
        let body = serde_json::to_string(&request).map_err(|source| ProviderError::Encode {
            provider: Provider::Anthropic,
            source,
        })?;

        let mut headers = Vec::new();
        if let Some(key) = config.credential() {
            headers.push(("x-api-key", key.to_string()));
        }
        headers.push(("anthropic-version", ANTHROPIC_VERSION.to_string()));

        Ok(WireRequest {
            url: format!("{}/v1/messages", self.base_url),
            headers,
            body,
            timeout: Provider::Anthropic.timeout(),
        })
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let response: ClaudeResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::malformed(Provider::Anthropic, e.to_string()))?;

        let text = response
            .content
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(Provider::Anthropic, "no content blocks in response"))?
            .text
            .unwrap_or_default();

        non_empty(Provider::Anthropic, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn api() -> ClaudeApi {
        ClaudeApi::new("https://api.anthropic.com")
    }

    fn body_of(messages: &[ChatMessage]) -> Value {
        let config = ProviderConfig::new(Provider::Anthropic).with_credential("ak-test");
        let request = api().build_request(messages, &config).unwrap();
        serde_json::from_str(&request.body).unwrap()
    }

    #[test]
    fn test_system_is_hoisted() {
        let body = body_of(&[
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
        ]);

        assert_eq!(body["system"], "be brief");
        let turns = body["messages"].as_array().unwrap();
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t["role"] != "system"));
        assert_eq!(turns[0]["role"], "user");
        assert_eq!(turns[1]["role"], "assistant");
        assert_eq!(body["max_tokens"], 1000);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_no_system_field_without_system_content() {
        let body = body_of(&[ChatMessage::user("hello")]);
        assert!(body.get("system").is_none());

        let body = body_of(&[ChatMessage::system("  "), ChatMessage::user("hello")]);
        assert!(body.get("system").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_multiple_system_messages_are_joined() {
        let body = body_of(&[
            ChatMessage::system("first"),
            ChatMessage::user("hello"),
            ChatMessage::system("second"),
        ]);
        assert_eq!(body["system"], "first\n\nsecond");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_system_only_conversation_is_rejected() {
        let config = ProviderConfig::new(Provider::Anthropic).with_credential("ak-test");
        let err = api()
            .build_request(&[ChatMessage::system("be brief")], &config)
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyConversation));
    }

    #[test]
    fn test_headers() {
        let config = ProviderConfig::new(Provider::Anthropic).with_credential("ak-test");
        let request = api()
            .build_request(&[ChatMessage::user("hello")], &config)
            .unwrap();
        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(request.header("x-api-key"), Some("ak-test"));
        assert_eq!(request.header("anthropic-version"), Some("2023-06-01"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn test_parse_first_content_block() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Hello there"}],"role":"assistant"}"#;
        assert_eq!(api().parse_response(body).unwrap(), "Hello there");
    }

    #[test]
    fn test_parse_missing_content_is_malformed() {
        let err = api().parse_response(r#"{"content":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));

        let err = api().parse_response(r#"{"type":"error"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }
}

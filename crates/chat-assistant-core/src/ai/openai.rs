use serde::{Deserialize, Serialize};

use super::{non_empty, ChatBackend, WireRequest, MAX_TOKENS};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::ChatMessage;

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

/// OpenAI chat completions. System messages stay inline.
#[derive(Clone)]
pub struct OpenAIApi {
    base_url: String,
}

impl OpenAIApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl ChatBackend for OpenAIApi {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<WireRequest, ProviderError> {
        let request = OpenAIRequest {
            model: &config.model,
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: MAX_TOKENS,
            temperature: config.temperature,
        };
        let body = serde_json::to_string(&request).map_err(|source| ProviderError::Encode {
            provider: Provider::OpenAI,
            source,
        })?;

        let mut headers = Vec::new();
        if let Some(key) = config.credential() {
            headers.push(("authorization", format!("Bearer {}", key)));
        }

        Ok(WireRequest {
            url: format!("{}/v1/chat/completions", self.base_url),
            headers,
            body,
            timeout: Provider::OpenAI.timeout(),
        })
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let response: OpenAIResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::malformed(Provider::OpenAI, e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(Provider::OpenAI, "no choices in response"))?
            .message
            .content
            .unwrap_or_default();

        non_empty(Provider::OpenAI, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn api() -> OpenAIApi {
        OpenAIApi::new("https://api.openai.com/")
    }

    #[test]
    fn test_request_shape() {
        let config = ProviderConfig::new(Provider::OpenAI)
            .with_credential("sk-test")
            .with_model("gpt-4")
            .with_temperature(0.5);
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hello")];

        let request = api().build_request(&messages, &config).unwrap();
        assert_eq!(request.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(request.header("Authorization"), Some("Bearer sk-test"));

        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}},{"message":{"content":"other"}}]}"#;
        assert_eq!(api().parse_response(body).unwrap(), "Hi!");
    }

    #[test]
    fn test_parse_no_choices_is_malformed() {
        let err = api().parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = api().parse_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_null_content_is_empty() {
        let err = api()
            .parse_response(r#"{"choices":[{"message":{"content":null}}]}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyCompletion { .. }));
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{non_empty, ChatBackend, WireRequest};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::{ChatMessage, ChatRole};

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

/// Local Ollama daemon. `/api/generate` takes a single prompt, so the
/// conversation is flattened into role-labelled lines.
#[derive(Clone)]
pub struct OllamaApi {
    base_url: String,
}

impl OllamaApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    pub fn parse_models(body: &str) -> Result<Vec<String>> {
        let models_response: OllamaModelsResponse = serde_json::from_str(body)?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

/// One `Role: content` line per message, then an open `Assistant: ` cue.
pub fn flatten_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str(message.role.label());
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str(ChatRole::Assistant.label());
    prompt.push_str(": ");
    prompt
}

impl ChatBackend for OllamaApi {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<WireRequest, ProviderError> {
        let request = OllamaRequest {
            model: &config.model,
            prompt: flatten_prompt(messages),
            stream: false,
        };
        let body = serde_json::to_string(&request).map_err(|source| ProviderError::Encode {
            provider: Provider::Ollama,
            source,
        })?;

        Ok(WireRequest {
            url: format!("{}/api/generate", self.base_url),
            headers: Vec::new(),
            body,
            timeout: Provider::Ollama.timeout(),
        })
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let response: OllamaResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::malformed(Provider::Ollama, e.to_string()))?;
        non_empty(Provider::Ollama, response.response)
    }
}

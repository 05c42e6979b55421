//! Provider adapters
//!
//! Each provider is a [`ChatBackend`]: a pure translator that turns the
//! uniform message list into that provider's HTTP request and pulls the
//! completion text back out of its response. [`ProviderAdapter`] picks the
//! backend from the config tag and does the actual I/O.

pub mod claude;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{Endpoints, ProviderConfig};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::ChatMessage;

pub use claude::ClaudeApi;
pub use ollama::OllamaApi;
pub use openai::OpenAIApi;

/// Upper bound on generated tokens for the cloud providers.
pub const MAX_TOKENS: u32 = 1000;

/// A fully prepared POST request.
pub struct WireRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    /// Serialized JSON body.
    pub body: String,
    pub timeout: Duration,
}

impl WireRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry credentials.
impl fmt::Debug for WireRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(n, _)| *n).collect();
        f.debug_struct("WireRequest")
            .field("url", &self.url)
            .field("headers", &names)
            .field("body_len", &self.body.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub trait ChatBackend: Send + Sync {
    fn provider(&self) -> Provider;

    fn build_request(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<WireRequest, ProviderError>;

    fn parse_response(&self, body: &str) -> Result<String, ProviderError>;
}

/// Rejects blank completions, which the chat front end cannot display.
pub(crate) fn non_empty(provider: Provider, text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyCompletion { provider })
    } else {
        Ok(text)
    }
}

#[derive(Clone)]
pub struct ProviderAdapter {
    client: Client,
    openai: OpenAIApi,
    claude: ClaudeApi,
    ollama: OllamaApi,
}

impl Default for ProviderAdapter {
    fn default() -> Self {
        Self::new(&Endpoints::default())
    }
}

impl ProviderAdapter {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            client: Client::new(),
            openai: OpenAIApi::new(&endpoints.openai),
            claude: ClaudeApi::new(&endpoints.anthropic),
            ollama: OllamaApi::new(&endpoints.ollama),
        }
    }

    pub fn backend(&self, provider: Provider) -> &dyn ChatBackend {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Anthropic => &self.claude,
            Provider::Ollama => &self.ollama,
        }
    }

    /// Sends `messages` to the configured provider and returns the completion.
    ///
    /// Validation happens before anything is sent. There is no retry; the
    /// caller decides what to do with a failure.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &ProviderConfig,
    ) -> Result<String, ProviderError> {
        config.validate()?;
        if messages.is_empty() {
            return Err(ProviderError::EmptyConversation);
        }

        let provider = config.provider;
        let backend = self.backend(provider);
        let request = backend.build_request(messages, config)?;

        info!(
            provider = provider.as_str(),
            model = %config.model,
            messages = messages.len(),
            "sending completion request"
        );
        debug!(?request, "prepared request");

        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|source| {
                warn!(provider = provider.as_str(), error = %source, "request failed");
                ProviderError::Network { provider, source }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ProviderError::Network { provider, source })?;

        if !status.is_success() {
            warn!(provider = provider.as_str(), status = status.as_u16(), "provider returned an error status");
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
                body: text,
            });
        }

        let completion = backend.parse_response(&text)?;
        debug!(provider = provider.as_str(), chars = completion.len(), "received completion");
        Ok(completion)
    }

    /// Names of the models pulled into the local daemon.
    pub async fn list_local_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.ollama.tags_url())
            .timeout(Provider::Ollama.timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list models: {}", response.status()));
        }

        let body = response.text().await?;
        OllamaApi::parse_models(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
            ChatMessage::user("how are you?"),
        ]
    }

    fn config_for(provider: Provider) -> ProviderConfig {
        ProviderConfig::new(provider).with_credential("test-key")
    }

    #[test]
    fn test_backend_matches_tag() {
        let adapter = ProviderAdapter::default();
        for provider in Provider::all() {
            assert_eq!(adapter.backend(provider).provider(), provider);
        }
    }

    #[test]
    fn test_request_bodies_are_deterministic() {
        let adapter = ProviderAdapter::default();
        let messages = sample();
        for provider in Provider::all() {
            let backend = adapter.backend(provider);
            let config = config_for(provider);
            let first = backend.build_request(&messages, &config).unwrap();
            let second = backend.build_request(&messages, &config).unwrap();
            assert_eq!(first.body, second.body, "{provider} body changed between calls");
            assert_eq!(first.url, second.url);
            assert_eq!(first.headers, second.headers);
        }
    }

    #[test]
    fn test_timeouts_follow_provider() {
        let adapter = ProviderAdapter::default();
        for provider in Provider::all() {
            let request = adapter
                .backend(provider)
                .build_request(&sample(), &config_for(provider))
                .unwrap();
            assert_eq!(request.timeout, provider.timeout());
        }
    }

    #[test]
    fn test_debug_redacts_headers() {
        let adapter = ProviderAdapter::default();
        let request = adapter
            .backend(Provider::OpenAI)
            .build_request(&sample(), &config_for(Provider::OpenAI))
            .unwrap();
        let rendered = format!("{:?}", request);
        assert!(rendered.contains("authorization"));
        assert!(!rendered.contains("test-key"));
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_request() {
        // Unroutable endpoint: reaching the network would fail differently.
        let endpoints = Endpoints {
            openai: "http://127.0.0.1:9".to_string(),
            ..Endpoints::default()
        };
        let adapter = ProviderAdapter::new(&endpoints);
        let err = adapter
            .complete(&sample(), &ProviderConfig::new(Provider::OpenAI))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn test_empty_conversation_is_rejected() {
        let adapter = ProviderAdapter::default();
        let err = adapter
            .complete(&[], &ProviderConfig::new(Provider::Ollama))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyConversation));
    }
}

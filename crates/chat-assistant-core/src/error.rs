use thiserror::Error;

use crate::provider::Provider;

/// Failure of a single provider call. The conversation passed in is never
/// modified when one of these is returned.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key is required")]
    MissingCredential { provider: Provider },

    #[error("model identifier must not be empty")]
    InvalidModel,

    #[error("temperature {0} is outside 0.0..=2.0")]
    InvalidTemperature(f32),

    #[error("conversation has no messages")]
    EmptyConversation,

    #[error("failed to encode {provider} request: {source}")]
    Encode {
        provider: Provider,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} request failed: {source}")]
    Network {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a malformed response: {detail}")]
    MalformedResponse { provider: Provider, detail: String },

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: Provider },
}

impl ProviderError {
    pub fn malformed(provider: Provider, detail: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider,
            detail: detail.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Network { source, .. } if source.is_timeout())
    }
}

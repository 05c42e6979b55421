use std::time::Duration;

use serde::{Deserialize, Serialize};

const CLOUD_TIMEOUT: Duration = Duration::from_secs(30);
const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "ollama" | "local" => Some(Provider::Ollama),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::OpenAI, Provider::Anthropic, Provider::Ollama]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Ollama => "Ollama (Local)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-3.5-turbo",
            Provider::Anthropic => "claude-3-sonnet-20240229",
            Provider::Ollama => "llama2",
        }
    }

    /// Suggested models; the local daemon may have others pulled.
    pub fn models(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Provider::OpenAI => &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo-preview"],
            Provider::Anthropic => &[
                "claude-3-sonnet-20240229",
                "claude-3-opus-20240229",
                "claude-3-haiku-20240307",
            ],
            Provider::Ollama => &["llama2", "mistral", "codellama", "neural-chat"],
        };
        names.iter().map(|m| m.to_string()).collect()
    }

    pub fn requires_credential(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Ollama => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            Provider::Ollama => LOCAL_TIMEOUT,
            _ => CLOUD_TIMEOUT,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const WEATHER_KEY_ENV: &str = "WEATHER_API_KEY";

/// Everything a single completion call needs to know about the provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub credential: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
}

impl ProviderConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            credential: None,
            model: provider.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(SecretString::from(credential.into()));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Checks run before any request goes out.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.provider.requires_credential() && self.credential().is_none() {
            return Err(ProviderError::MissingCredential {
                provider: self.provider,
            });
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::InvalidModel);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ProviderError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }

    /// The credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_ref()
            .map(|c| c.expose_secret())
            .filter(|c| !c.trim().is_empty())
    }

    /// `*` per leading character (at most 8) followed by `...`.
    pub fn masked_credential(&self) -> Option<String> {
        self.credential()
            .map(|key| format!("{}...", "*".repeat(key.chars().take(8).count())))
    }
}

/// Base URLs of the external APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openai: String,
    pub anthropic: String,
    pub ollama: String,
    pub coindesk: String,
    pub weather: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com".to_string(),
            anthropic: "https://api.anthropic.com".to_string(),
            ollama: "http://localhost:11434".to_string(),
            coindesk: "https://api.coindesk.com".to_string(),
            weather: "http://api.weatherapi.com".to_string(),
        }
    }
}

/// Persisted user settings (`<config dir>/chat-assistant/config.json`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_system_prompt() -> Option<String> {
    Some(DEFAULT_SYSTEM_PROMPT.to_string())
}

fn default_temperature() -> Option<f32> {
    Some(DEFAULT_TEMPERATURE)
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::OpenAI.as_str().to_string()),
            default_model: None,
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            openai_api_key: None,
            anthropic_api_key: None,
            weather_api_key: None,
            endpoints: Endpoints::default(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chat-assistant").join("config.json"))
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::OpenAI)
    }

    pub fn stored_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
            Provider::Ollama => None,
        }
    }

    pub fn set_key(&mut self, provider: Provider, key: Option<String>) {
        match provider {
            Provider::OpenAI => self.openai_api_key = key,
            Provider::Anthropic => self.anthropic_api_key = key,
            Provider::Ollama => {}
        }
    }

    /// Resolves the credential for `provider`: explicit value, then the
    /// provider's environment variable, then the settings file. Blank values
    /// at any step fall through to the next one.
    pub fn resolve_key(&self, provider: Provider, explicit: Option<&str>) -> Option<String> {
        if !provider.requires_credential() {
            return None;
        }
        non_blank(explicit)
            .or_else(|| provider.credential_env_var().and_then(env_key))
            .or_else(|| non_blank(self.stored_key(provider)))
    }

    pub fn resolve_weather_key(&self, explicit: Option<&str>) -> Option<String> {
        non_blank(explicit)
            .or_else(|| env_key(WEATHER_KEY_ENV))
            .or_else(|| non_blank(self.weather_api_key.as_deref()))
    }

    /// The system prompt to send, `None` when disabled.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Builds the call configuration; `overrides` win over stored settings.
    pub fn provider_config(&self, overrides: &ConfigOverrides) -> ProviderConfig {
        let provider = overrides.provider.unwrap_or_else(|| self.provider());

        // A stored default model only applies to the provider it was saved for.
        let stored_model = self
            .default_model
            .clone()
            .filter(|_| provider == self.provider());

        let model = overrides
            .model
            .clone()
            .or(stored_model)
            .unwrap_or_else(|| provider.default_model().to_string());

        let temperature = overrides
            .temperature
            .or(self.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);

        let mut config = ProviderConfig::new(provider)
            .with_model(model)
            .with_temperature(temperature);
        if let Some(key) = self.resolve_key(provider, overrides.api_key.as_deref()) {
            config = config.with_credential(key);
        }
        config
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Value of an environment variable, `None` when unset or blank.
pub fn env_key(var: &str) -> Option<String> {
    non_blank(std::env::var(var).ok().as_deref())
}

/// Per-invocation values that take precedence over [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub api_key: Option<String>,
}

pub mod ai;
pub mod config;
pub mod error;
pub mod lookup;
pub mod provider;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatBackend, ClaudeApi, OllamaApi, OpenAIApi, ProviderAdapter, WireRequest};
pub use config::{ConfigOverrides, Endpoints, ProviderConfig, Settings};
pub use error::ProviderError;
pub use lookup::{BitcoinClient, PriceHistory, WeatherClient, WeatherReport};
pub use provider::Provider;
pub use state::{ChatMessage, ChatRole, Conversation, DEFAULT_SYSTEM_PROMPT};

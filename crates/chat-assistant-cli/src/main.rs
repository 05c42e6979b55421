use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::*;

use chat_assistant_core::config::env_key;
use chat_assistant_core::{
    BitcoinClient, ConfigOverrides, Conversation, Provider, ProviderAdapter, Settings,
    WeatherClient,
};

mod chat;

#[derive(Parser)]
#[command(name = "chat-assistant")]
#[command(about = "Chat with OpenAI, Anthropic or a local Ollama model", version)]
struct Cli {
    #[command(flatten)]
    llm: LlmArgs,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LlmArgs {
    /// LLM provider: openai, anthropic or ollama
    #[arg(short, long, global = true, value_parser = parse_provider)]
    provider: Option<Provider>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(short, long, global = true)]
    temperature: Option<f32>,

    /// System prompt; pass an empty string to disable it
    #[arg(long, global = true)]
    system: Option<String>,

    /// API key for the selected cloud provider
    #[arg(long, global = true)]
    api_key: Option<String>,
}

impl LlmArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider,
            model: self.model.clone(),
            temperature: self.temperature,
            api_key: self.api_key.clone(),
        }
    }

    fn system_prompt(&self, settings: &Settings) -> Option<String> {
        match &self.system {
            Some(prompt) if prompt.trim().is_empty() => None,
            Some(prompt) => Some(prompt.clone()),
            None => settings.system_prompt().map(str::to_string),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Ask a single question
    Ask {
        /// Your question
        question: String,
    },
    /// List models for the selected provider
    Models,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Download historical Bitcoin closing prices
    Bitcoin {
        /// First day (YYYY-MM-DD)
        #[arg(long, default_value = "2023-01-01")]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long, default_value = "2023-12-31")]
        end: NaiveDate,
    },
    /// Show the current weather for a city
    Weather {
        /// City name
        #[arg(default_value = "Madrid")]
        city: String,
        /// WeatherAPI key
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Print the settings file location
    Path,
    /// Set the default provider
    SetProvider {
        #[arg(value_parser = parse_provider)]
        provider: Provider,
    },
    /// Set the default model
    SetModel { model: String },
    /// Store an API key for a provider
    SetKey {
        #[arg(value_parser = parse_provider)]
        provider: Provider,
        key: String,
    },
    /// Store the WeatherAPI key
    SetWeatherKey { key: String },
    /// Set the system prompt (empty string disables it)
    SetSystem { prompt: String },
    /// Set the default temperature
    SetTemperature { value: f32 },
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    Provider::from_str(s).ok_or_else(|| {
        format!("unknown provider '{}', expected openai, anthropic or ollama", s)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load settings, using defaults");
        Settings::new()
    });

    match &cli.command {
        Commands::Chat => {
            let adapter = ProviderAdapter::new(&settings.endpoints);
            let config = settings.provider_config(&cli.llm.overrides());
            chat::run(&adapter, config, cli.llm.system_prompt(&settings)).await?
        }
        Commands::Ask { question } => ask(&settings, &cli.llm, question).await?,
        Commands::Models => list_models(&settings, &cli.llm).await,
        Commands::Config { action } => configure(settings, action)?,
        Commands::Bitcoin { start, end } => bitcoin(&settings, *start, *end).await?,
        Commands::Weather { city, key } => weather(&settings, city, key.as_deref()).await?,
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

async fn ask(settings: &Settings, llm: &LlmArgs, question: &str) -> Result<()> {
    let adapter = ProviderAdapter::new(&settings.endpoints);
    let config = settings.provider_config(&llm.overrides());
    let system_prompt = llm.system_prompt(settings);

    if let Err(e) = config.validate() {
        chat::report_invalid_config(&config, &e);
        std::process::exit(1);
    }

    println!(
        "🤖 Asking {} ({})...\n",
        config.provider.display_name().bold(),
        config.model.magenta()
    );

    match Conversation::new()
        .exchange(&adapter, &config, system_prompt.as_deref(), question)
        .await
    {
        Ok(conversation) => {
            if let Some(reply) = conversation.messages().last() {
                println!("{}", reply.content);
            }
        }
        Err(e) => {
            chat::report_failure(config.provider, &e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn list_models(settings: &Settings, llm: &LlmArgs) {
    let provider = llm.provider.unwrap_or_else(|| settings.provider());

    println!("\n{}", format!("🤖 {} Models", provider.display_name()).bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    let models = if provider == Provider::Ollama {
        let adapter = ProviderAdapter::new(&settings.endpoints);
        match adapter.list_local_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                println!("{}", "No local models found. Pull one with: ollama pull llama2".yellow());
                provider.models()
            }
            Err(e) => {
                println!("{}: {}", "Error connecting to Ollama".red(), e);
                println!("Make sure Ollama is running: {}", "ollama serve".bold());
                println!("{}", "Suggested models:".dimmed());
                provider.models()
            }
        }
    } else {
        provider.models()
    };

    for model in models {
        println!("  • {}", model.green());
    }
}

fn configure(mut settings: Settings, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            show_settings(&settings);
            return Ok(());
        }
        ConfigAction::Path => {
            println!("{}", Settings::get_config_path()?.display());
            return Ok(());
        }
        ConfigAction::SetProvider { provider } => {
            settings.provider = Some(provider.as_str().to_string());
            settings.default_model = None;
        }
        ConfigAction::SetModel { model } => settings.default_model = Some(model.clone()),
        ConfigAction::SetKey { provider, key } => {
            if !provider.requires_credential() {
                println!("{} does not use an API key", provider.display_name());
                return Ok(());
            }
            settings.set_key(*provider, Some(key.clone()));
        }
        ConfigAction::SetWeatherKey { key } => settings.weather_api_key = Some(key.clone()),
        ConfigAction::SetSystem { prompt } => settings.system_prompt = Some(prompt.clone()),
        ConfigAction::SetTemperature { value } => {
            if !(0.0..=2.0).contains(value) {
                anyhow::bail!("Temperature must be between 0.0 and 2.0");
            }
            settings.temperature = Some(*value);
        }
    }

    settings.save()?;
    println!("{}", "✓ Settings saved".green());
    Ok(())
}

fn show_settings(settings: &Settings) {
    let config = settings.provider_config(&ConfigOverrides::default());

    println!("\n{}", "⚙️  Current Configuration".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    chat::print_config(&config, settings.system_prompt());

    for provider in Provider::all().into_iter().filter(Provider::requires_credential) {
        let source = if provider.credential_env_var().and_then(env_key).is_some() {
            "env"
        } else if settings.stored_key(provider).is_some_and(|k| !k.trim().is_empty()) {
            "config"
        } else {
            "not set"
        };
        println!("{} key: {}", provider.display_name(), source.dimmed());
    }

    println!("\n{}", "Endpoints:".bold());
    println!("  OpenAI:    {}", settings.endpoints.openai);
    println!("  Anthropic: {}", settings.endpoints.anthropic);
    println!("  Ollama:    {}", settings.endpoints.ollama);
}

async fn bitcoin(settings: &Settings, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        println!("{}", "The start date must be on or before the end date.".red());
        return Ok(());
    }

    let client = BitcoinClient::new(&settings.endpoints.coindesk);
    let history = match client.fetch_history(start, end).await {
        Ok(history) => history,
        Err(e) => {
            println!("{}: {}", "Error downloading prices".red(), e);
            return Ok(());
        }
    };

    println!(
        "{}",
        format!("✓ Downloaded prices for {} to {}", start, end).green()
    );
    if let (Some(first), Some(last)) = (history.first_date(), history.last_date()) {
        println!("{}", format!("✓ Data covers {} to {}", first, last).green());
    }

    println!("\n{}", "📈 Bitcoin closing prices".bold().blue());
    println!("{:<12} {:>12}", "Date".bold(), "Price".bold());
    for point in history.points() {
        println!("{:<12} {:>12.2}", point.date.to_string(), point.price);
    }

    if let (Some(min), Some(max)) = (history.min(), history.max()) {
        println!();
        println!("Low:  {} on {}", format!("{:.2}", min.price).red(), min.date);
        println!("High: {} on {}", format!("{:.2}", max.price).green(), max.date);
    }

    Ok(())
}

async fn weather(settings: &Settings, city: &str, key: Option<&str>) -> Result<()> {
    let Some(key) = settings.resolve_weather_key(key) else {
        println!(
            "{}",
            "A WeatherAPI key is required. Pass --key, set WEATHER_API_KEY or run: chat-assistant config set-weather-key <KEY>"
                .red()
        );
        return Ok(());
    };

    let client = WeatherClient::new(&settings.endpoints.weather, &key);
    match client.current(city).await {
        Ok(report) => {
            println!("\n{}", format!("🌤  Weather in {}", report.city).bold().blue());
            println!("{}", "=".repeat(30).dimmed());
            println!("Temperature:  {}°C", report.temp_c);
            println!("Description:  {}", report.description);
            println!("Humidity:     {}%", report.humidity);
            println!("Wind speed:   {} km/h", report.wind_kph);
        }
        Err(e) => println!("{}: {}", "Error fetching weather".red(), e),
    }

    Ok(())
}

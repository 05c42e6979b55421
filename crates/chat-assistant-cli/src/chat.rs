use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};

use chat_assistant_core::{
    ChatRole, Conversation, Provider, ProviderAdapter, ProviderConfig, ProviderError,
};

enum Command {
    Quit,
    Clear,
    Config,
    History,
    Help,
    Prompt,
}

fn parse_command(input: &str) -> Command {
    match input {
        "/quit" | "/exit" => Command::Quit,
        "/clear" => Command::Clear,
        "/config" => Command::Config,
        "/history" => Command::History,
        "/help" => Command::Help,
        _ => Command::Prompt,
    }
}

pub async fn run(
    adapter: &ProviderAdapter,
    config: ProviderConfig,
    system_prompt: Option<String>,
) -> Result<()> {
    println!("\n{}", "🤖 LLM Chat Assistant".bold().blue());
    println!(
        "Chatting with {} using {}. Type {} for commands.\n",
        config.provider.display_name().bold(),
        config.model.magenta(),
        "/help".bold()
    );

    // A missing key blocks the session before anything is sent.
    if let Err(e) = config.validate() {
        report_invalid_config(&config, &e);
        return Ok(());
    }

    let mut conversation = Conversation::new();

    loop {
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match parse_command(input) {
            Command::Quit => break,
            Command::Clear => {
                conversation.clear();
                println!("{}", "Chat history cleared.".dimmed());
            }
            Command::Config => print_config(&config, system_prompt.as_deref()),
            Command::History => print_history(&conversation),
            Command::Help => print_help(),
            Command::Prompt => {
                println!(
                    "{}",
                    format!("Getting response from {}...", config.provider.display_name()).dimmed()
                );
                match conversation
                    .exchange(adapter, &config, system_prompt.as_deref(), input)
                    .await
                {
                    Ok(next) => {
                        if let Some(reply) = next.messages().last() {
                            println!("\n{}\n{}\n", "Assistant:".bold().green(), reply.content);
                        }
                        conversation = next;
                    }
                    Err(e) => report_failure(config.provider, &e),
                }
            }
        }
    }

    Ok(())
}

pub fn report_failure(provider: Provider, error: &ProviderError) {
    println!("{}", format!("Error calling {} API: {}", provider.display_name(), error).red());
    if provider == Provider::Ollama && matches!(error, ProviderError::Network { .. }) {
        println!("Make sure Ollama is running: {}", "ollama serve".bold());
    }
    println!(
        "{}",
        "Failed to get response from the model. Please check your configuration.".red()
    );
}

pub fn report_invalid_config(config: &ProviderConfig, error: &ProviderError) {
    match error {
        ProviderError::MissingCredential { provider } => {
            println!(
                "{}",
                format!("Please enter your {} API key.", provider.display_name()).red()
            );
            if let Some(var) = provider.credential_env_var() {
                println!(
                    "Pass {}, set {} or run: {}",
                    "--api-key".bold(),
                    var.bold(),
                    format!("chat-assistant config set-key {} <KEY>", provider.as_str()).bold()
                );
            }
        }
        other => println!(
            "{}",
            format!("Invalid {} configuration: {}", config.provider.display_name(), other).red()
        ),
    }
}

pub fn print_config(config: &ProviderConfig, system_prompt: Option<&str>) {
    println!("{} {}", "Provider:".bold(), config.provider.display_name());
    println!("{} {}", "Model:".bold(), config.model);
    println!("{} {}", "Temperature:".bold(), config.temperature);
    if let Some(masked) = config.masked_credential() {
        println!("{} {}", "API Key:".bold(), masked);
    }
    match system_prompt {
        Some(prompt) => println!("{} {}", "System Prompt:".bold(), prompt.dimmed()),
        None => println!("{} {}", "System Prompt:".bold(), "(none)".dimmed()),
    }
}

fn print_history(conversation: &Conversation) {
    if conversation.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for message in conversation.messages() {
        let label = match message.role {
            ChatRole::User => "You:".bold().cyan(),
            ChatRole::Assistant => "Assistant:".bold().green(),
            ChatRole::System => "System:".bold().yellow(),
        };
        println!("{} {}", label, message.content);
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /clear    clear the chat history");
    println!("  /config   show the current configuration");
    println!("  /history  show the conversation so far");
    println!("  /quit     leave the chat");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert!(matches!(parse_command("/quit"), Command::Quit));
        assert!(matches!(parse_command("/exit"), Command::Quit));
        assert!(matches!(parse_command("/clear"), Command::Clear));
        assert!(matches!(parse_command("/config"), Command::Config));
        assert!(matches!(parse_command("what is /clear?"), Command::Prompt));
        assert!(matches!(parse_command("/unknown"), Command::Prompt));
    }
}

//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod say;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::api::client::{ClientSettings, CompletionClient, OpenRouterClient};
use crate::cli::auth::{run_auth, run_deauth};
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::credential::{store_for, CredentialHolder};
use crate::logging::init_tracing;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "abz")]
#[command(about = "A terminal chat client for OpenRouter-compatible APIs")]
#[command(
    long_about = "Abz is a full-screen terminal chat interface that sends your conversation \
to an OpenRouter-compatible chat-completions endpoint and shows the reply.\n\n\
Authentication:\n\
  Use 'abz auth' to store your API key in the system keyring, or enter it in\n\
  the settings overlay (Ctrl+S) inside the chat.\n\n\
Environment Variables:\n\
  ABZ_API_KEY       API key for this run only (never stored)\n\
  ABZ_LOG           Log filter, e.g. 'debug' or 'abz=trace' (default: warn)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt/Shift+Enter   Insert a new line\n\
  Ctrl+S            Open settings\n\
  Esc               Close settings\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run instead of the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Keep the API key in memory only; never read or write the keyring or key file
    #[arg(long, global = true)]
    pub env_only: bool,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// Print the conversation as an HTML fragment instead of the bare reply
        #[arg(long)]
        html: bool,
        /// Message text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Store an API key
    Auth,
    /// Remove the stored API key
    Deauth,
    /// Set configuration values, or print them all when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug_log.as_deref());

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

/// Everything a session needs: effective config, the credential and a client.
pub struct Session {
    pub config: Config,
    pub credential: CredentialHolder,
    pub client: Arc<dyn CompletionClient>,
}

pub fn build_session(model: Option<String>, env_only: bool) -> Result<Session, Box<dyn Error>> {
    let mut config = Config::load()?;
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        config.model = Some(model);
    }

    let credential = CredentialHolder::load(store_for(&config, env_only)?).with_env_override();
    let client = OpenRouterClient::new(ClientSettings::from_config(&config))?;
    debug!(model = config.model(), base_url = config.base_url(), "session ready");

    Ok(Session {
        config,
        credential,
        client: Arc::new(client),
    })
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let session = build_session(args.model, args.env_only)?;
            run_chat(session.config, session.credential, session.client).await
        }
        Commands::Say { html, prompt } => {
            let session = build_session(args.model, args.env_only)?;
            run_say(session, prompt, html).await
        }
        Commands::Auth => {
            let config = Config::load()?;
            if let Err(e) = run_auth(&config, args.env_only) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            let config = Config::load()?;
            if let Err(e) = run_deauth(&config, args.env_only) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            let value = value.unwrap_or_default().join(" ");
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            match config.set_value(&key, &value) {
                Ok(()) => {
                    config.save()?;
                    println!("✅ Set {key} to: {value}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match config.unset_value(&key) {
                Ok(()) => {
                    config.save()?;
                    println!("✅ Unset {key}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    #[test]
    fn no_subcommand_means_chat() {
        let args = parse_args(&["abz"]);
        assert!(args.command.is_none());
        assert!(!args.env_only);
        assert!(args.model.is_none());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args = parse_args(&["abz", "chat", "-m", "anthropic/claude-3-haiku", "--env-only"]);
        assert!(matches!(args.command, Some(Commands::Chat)));
        assert_eq!(args.model.as_deref(), Some("anthropic/claude-3-haiku"));
        assert!(args.env_only);
    }

    #[test]
    fn say_collects_prompt_words() {
        let args = parse_args(&["abz", "say", "--html", "hello", "-there", "world"]);
        match args.command {
            Some(Commands::Say { html, prompt }) => {
                assert!(html);
                assert_eq!(prompt, vec!["hello", "-there", "world"]);
            }
            _ => panic!("expected say subcommand"),
        }
    }

    #[test]
    fn set_accepts_multi_word_values_and_bare_form() {
        let args = parse_args(&["abz", "set", "persona", "Be", "brief."]);
        match args.command {
            Some(Commands::Set { key, value }) => {
                assert_eq!(key.as_deref(), Some("persona"));
                assert_eq!(value, Some(vec!["Be".to_string(), "brief.".to_string()]));
            }
            _ => panic!("expected set subcommand"),
        }

        let args = parse_args(&["abz", "set"]);
        assert!(matches!(
            args.command,
            Some(Commands::Set {
                key: None,
                value: None
            })
        ));
    }

    #[test]
    fn debug_log_takes_a_path() {
        let args = parse_args(&["abz", "--debug-log", "/tmp/abz.log"]);
        assert_eq!(args.debug_log, Some(PathBuf::from("/tmp/abz.log")));
    }
}

//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod catalog;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::catalog::{list_languages, list_voices, print_health, print_status};
use crate::cli::say::{print_error, run_say, run_transcribe};
use crate::cli::settings::{SetContext, SettingError, SettingRegistry};
use crate::core::config::data::{path_display, Config};
use crate::core::config::RuntimeConfig;
use crate::core::error::TutorError;
use crate::core::languages;
use crate::core::session::TutorSession;
use crate::core::state::LEARNING_KEYS;
use crate::core::store::StateStore;
use crate::providers::ProviderKind;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "lingo")]
#[command(version)]
#[command(about = "A terminal language tutor with spoken replies")]
#[command(
    long_about = "Lingo is a conversational language tutor for the terminal. Each message you \
send gets a reply in the language you are learning, short feedback on your grammar and \
vocabulary, and an update to your progress, goals and estimated level.\n\n\
Providers:\n\
  openai, groq and anthropic, called directly with an API key or through a proxy\n\
  (LINGO_AI_API_BASE) that holds the credentials.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY / GROQ_API_KEY / ANTHROPIC_API_KEY   Keys for direct calls\n\
  LINGO_AI_API_BASE       Chat proxy base URL\n\
  LINGO_AUDIO_API_BASE    Local audio API base URL\n\
  LINGO_PLAYER            Command that plays synthesized speech\n\
  LINGO_LOG               Log filter (default: lingo=info)\n\n\
Chat commands:\n\
  /help             List every command\n\
  /record <wav>     Transcribe a recording and send it\n\
  /dump [file]      Save the conversation to a text file"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider for this run (openai, groq, anthropic)
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Model for this run
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language to practise for this run
    #[arg(short = 'L', long, global = true, value_name = "LANGUAGE")]
    pub language: Option<String>,

    /// Do not speak replies during this run
    #[arg(long = "no-tts", global = true)]
    pub no_tts: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive tutor (default)
    Chat,
    /// Send one message and print the reply with feedback
    Say {
        /// Message to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Transcribe a WAV recording in the selected language
    Transcribe {
        /// Path to a WAV file
        file: PathBuf,
        /// Send the transcript to the tutor as a message
        #[arg(long)]
        send: bool,
    },
    /// List the voices offered by the speech service
    Voices,
    /// List the languages that can be practised
    Languages,
    /// Check the audio API endpoints
    Health,
    /// Show the resolved configuration and saved learning state
    Status,
    /// Set configuration values (lists them when no key is given)
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// Provider, for provider-keyed settings
        value: Option<String>,
    },
    /// Clear the conversation and learning progress
    Reset {
        /// Also clear provider, model, voice and other saved selections
        #[arg(long)]
        all: bool,
    },
}

/// Per-run choices from global flags. They change the session in memory only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub no_tts: bool,
}

impl SessionOverrides {
    pub fn from_args(args: &Args) -> Self {
        Self {
            provider: args.provider.clone(),
            model: args.model.clone(),
            language: args.language.clone(),
            no_tts: args.no_tts,
        }
    }

    pub fn apply(&self, session: &mut TutorSession) -> Result<(), TutorError> {
        if let Some(input) = self.provider.as_deref() {
            let kind = ProviderKind::parse(input).ok_or_else(|| {
                TutorError::config(format!(
                    "Unknown provider: {input}. Choose openai, groq or anthropic."
                ))
            })?;
            session.state.settings.provider = kind;
        }
        if let Some(model) = self.model.as_deref() {
            let provider = session.state.settings.provider;
            session.state.settings.set_model(provider, model);
        }
        if let Some(input) = self.language.as_deref() {
            let language = languages::find(&session.languages, input).ok_or_else(|| {
                TutorError::config(format!("Language not available: {input}. See `lingo languages`."))
            })?;
            session.state.settings.language = language.value.clone();
        }
        if self.no_tts {
            session.state.settings.tts_enabled = false;
        }
        Ok(())
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let overrides = SessionOverrides::from_args(&args);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => {
            let config_path = Config::get_config_path();
            match key {
                None => print_settings(&SettingRegistry::new(), &config_path)?,
                Some(key) => report_setting(apply_set(&key, &value, &config_path)),
            }
            Ok(())
        }
        Commands::Unset { key, value } => {
            let config_path = Config::get_config_path();
            report_setting(apply_unset(&key, value.as_deref(), &config_path));
            Ok(())
        }
        Commands::Reset { all } => {
            let mut store = StateStore::open_default()?;
            reset_store(&mut store, all)?;
            if all {
                println!("✅ Cleared all saved state");
            } else {
                println!("✅ Cleared the conversation and learning progress");
            }
            Ok(())
        }
        Commands::Status => {
            let config = Config::load()?;
            let runtime = RuntimeConfig::from_env(&config);
            let store = StateStore::open_default()?;
            print_status(&runtime, &store);
            println!("Config file: {}", path_display(Config::get_config_path()));
            Ok(())
        }
        Commands::Voices => {
            let session = open_session(&overrides, false).await?;
            list_voices(&session).await
        }
        Commands::Languages => {
            let session = open_session(&overrides, false).await?;
            list_languages(&session).await
        }
        Commands::Health => {
            let session = open_session(&overrides, false).await?;
            print_health(&session).await;
            Ok(())
        }
        Commands::Say { text } => {
            let mut session = open_session(&overrides, true).await?;
            run_say(&mut session, text).await
        }
        Commands::Transcribe { file, send } => {
            let mut session = open_session(&overrides, true).await?;
            run_transcribe(&mut session, &file, send).await
        }
        Commands::Chat => {
            let session = open_session(&overrides, true).await?;
            run_chat(session).await
        }
    }
}

/// Load configuration and saved state, then apply the per-run overrides.
///
/// `bootstrap` fetches the language and voice lists first, which every
/// command that sends a turn needs.
async fn open_session(
    overrides: &SessionOverrides,
    bootstrap: bool,
) -> Result<TutorSession, Box<dyn Error>> {
    let config = Config::load()?;
    let runtime = RuntimeConfig::from_env(&config);
    let store = StateStore::open_default()?;
    let http = reqwest::Client::new();

    let mut session = TutorSession::new(store, runtime, http);
    if bootstrap {
        session.bootstrap().await;
    }
    if let Err(err) = overrides.apply(&mut session) {
        print_error(&err);
        std::process::exit(1);
    }
    Ok(session)
}

pub fn apply_set(key: &str, args: &[String], config_path: &Path) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let config = Config::load_from_path(config_path)
        .map_err(|e| SettingError::ConfigError(e.to_string()))?;
    let ctx = SetContext {
        config: &config,
        config_path,
    };
    handler.set(args, &ctx)
}

pub fn apply_unset(
    key: &str,
    value: Option<&str>,
    config_path: &Path,
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    let config = Config::load_from_path(config_path)
        .map_err(|e| SettingError::ConfigError(e.to_string()))?;
    let ctx = SetContext {
        config: &config,
        config_path,
    };
    handler.unset(value, &ctx)
}

fn report_setting(result: Result<String, SettingError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

/// Current value of every key, in registry order.
pub fn format_settings(registry: &SettingRegistry, config: &Config) -> String {
    let mut out = String::from("Settings:\n");
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            out.push_str(&handler.format(config));
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

fn print_settings(registry: &SettingRegistry, config_path: &Path) -> Result<(), Box<dyn Error>> {
    let config = Config::load_from_path(config_path)?;
    println!("{}", format_settings(registry, &config));
    println!();
    println!("Config file: {}", path_display(config_path));
    Ok(())
}

/// Drop the learning keys, or every key when `all` is set.
pub fn reset_store(store: &mut StateStore, all: bool) -> Result<(), TutorError> {
    if all {
        store.clear()?;
    } else {
        for key in LEARNING_KEYS {
            store.remove(key)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;

//! Error types for settings operations.

use std::fmt;

#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    UnknownProvider { input: String },
    /// The value is not one of the accepted choices.
    InvalidChoice {
        key: &'static str,
        input: String,
        choices: &'static [&'static str],
    },
    InvalidNumber { key: &'static str, input: String },
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// Persisting the configuration failed.
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Run 'lingo set' to list the available keys.");
            }
            SettingError::UnknownProvider { input } => {
                eprintln!("❌ Unknown provider: {input}. Choose openai, groq or anthropic.");
            }
            SettingError::InvalidChoice {
                key,
                input,
                choices,
            } => {
                eprintln!("❌ Invalid value for {key}: {input}");
                eprintln!("   Use one of: {}", choices.join(", "));
            }
            SettingError::InvalidNumber { key, input } => {
                eprintln!("❌ {key} expects a positive number, got: {input}");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigError(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SettingError::MissingArgs { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::UnknownProvider { input } => write!(f, "Unknown provider: {input}"),
            SettingError::InvalidChoice { key, input, .. } => {
                write!(f, "Invalid value for {key}: {input}")
            }
            SettingError::InvalidNumber { key, input } => {
                write!(f, "Invalid number for {key}: {input}")
            }
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

//! Helper functions for settings operations.

use std::path::Path;

use crate::core::config::data::Config;
use crate::providers::ProviderKind;

use super::error::SettingError;

/// Wrapper around [`Config::mutate_at`] that maps errors to `SettingError::ConfigError`.
pub fn mutate_config<F>(path: &Path, f: F) -> Result<(), SettingError>
where
    F: FnOnce(&mut Config),
{
    Config::mutate_at(path, |config| {
        f(config);
        Ok(())
    })
    .map_err(|e| SettingError::ConfigError(e.to_string()))
}

pub fn mutate_config_with_message<F>(
    path: &Path,
    f: F,
    message: String,
) -> Result<String, SettingError>
where
    F: FnOnce(&mut Config),
{
    mutate_config(path, f)?;
    Ok(message)
}

pub fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}

/// Accepts on/off, true/false, yes/no, 1/0 (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Canonical provider id for `input`.
pub fn validate_provider(input: &str) -> Result<ProviderKind, SettingError> {
    ProviderKind::parse(input).ok_or_else(|| SettingError::UnknownProvider {
        input: input.to_string(),
    })
}

/// Truncate a string to `max_chars` characters, appending "..." if truncated.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

//! `lingo set` / `lingo unset`: edits to `config.toml`.
//!
//! Each key has a [`SettingHandler`]. Handlers come in a few shapes:
//!
//! - Simple validated values (`default-provider`, `backend`, `silence-threshold`)
//! - Free text (`ai-api-base`, `stt-model`, `player`, ...)
//! - Provider-keyed maps (`default-model`, `base-url`)
//! - Lists (`languages`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use std::path::Path;

use crate::core::config::data::Config;

/// What a handler may look at while applying a change.
pub struct SetContext<'a> {
    /// Snapshot taken before the change
    pub config: &'a Config,
    pub config_path: &'a Path,
}

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Apply `args` and return the confirmation to print.
    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError>;

    /// Clear the value. `args` carries the provider for provider-keyed settings.
    fn unset(&self, args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError>;

    /// One or more indented lines for `lingo set` with no arguments.
    fn format(&self, config: &Config) -> String;
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Contents of `config.toml`.
///
/// Everything here is optional. Environment variables override these values
/// (see [`super::runtime::RuntimeConfig`]), and per-user choices such as the
/// selected provider live in the state store rather than here.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Provider used when the state store has no selection yet
    pub default_provider: Option<String>,
    /// Model per provider id, lowercase keys (e.g. `openai = "gpt-4o-mini"`)
    #[serde(default)]
    pub default_models: HashMap<String, String>,
    /// `direct` or `proxy`; inferred from `ai_api_base` when unset
    pub backend: Option<String>,
    /// Base URL of the chat proxy exposing /chat, /analyze, /proficiency, /goals
    pub ai_api_base: Option<String>,
    /// Base URL of the local audio API exposing /voices, /languages, /transcribe, /tts
    pub audio_api_base: Option<String>,
    /// `local` or `openai`; inferred from `audio_api_base` when unset
    pub audio_backend: Option<String>,
    pub stt_model: Option<String>,
    pub tts_model: Option<String>,
    pub tts_format: Option<String>,
    pub default_voice: Option<String>,
    pub system_prompt: Option<String>,
    /// Languages offered for selection; replaces the fetched list when non-empty
    #[serde(default)]
    pub languages: Vec<String>,
    /// Endpoint receiving `{t, message}` log lines
    pub log_endpoint: Option<String>,
    /// Endpoint receiving per-turn timing samples
    pub metrics_endpoint: Option<String>,
    /// Command used to play synthesized speech (the audio file path is appended)
    pub player: Option<String>,
    /// RMS amplitude below which captured audio counts as silence
    pub silence_threshold: Option<f32>,
    /// Trailing silence, in milliseconds, that ends a recording
    pub silence_duration_ms: Option<u64>,
    /// Per-provider base URL overrides, keyed by provider id
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

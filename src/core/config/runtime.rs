//! Effective configuration: `config.toml` with environment overrides applied.

use std::collections::HashMap;
use std::time::Duration;

use crate::core::builtin_providers::load_builtin_providers;
use crate::core::config::data::Config;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful language tutor. Respond concisely and clearly.";
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_SILENCE_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatBackend {
    /// Call the vendor chat APIs with a locally configured key.
    Direct,
    /// Call a self-hosted proxy that holds the credentials.
    Proxy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    /// The locally hosted audio API (`/transcribe`, `/tts`, ...).
    Local,
    /// OpenAI-compatible `audio/transcriptions` and `audio/speech`.
    OpenAi,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub chat_backend: ChatBackend,
    pub ai_api_base: Option<String>,
    pub audio_backend: AudioBackend,
    pub audio_api_base: Option<String>,
    pub stt_model: Option<String>,
    pub tts_model: Option<String>,
    pub tts_format: Option<String>,
    pub default_voice: Option<String>,
    pub system_prompt: String,
    pub languages: Vec<String>,
    pub default_provider: Option<String>,
    pub default_models: HashMap<String, String>,
    pub api_keys: HashMap<String, String>,
    pub base_urls: HashMap<String, String>,
    pub log_endpoint: Option<String>,
    pub metrics_endpoint: Option<String>,
    pub player: Option<String>,
    pub silence_threshold: f32,
    pub silence_duration: Duration,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

impl RuntimeConfig {
    pub fn from_env(config: &Config) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Merge `config` with variables from `lookup`; variables win.
    pub fn resolve<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));
        let pick = |name: &str, fallback: &Option<String>| {
            var(name).or_else(|| non_empty(fallback.clone()))
        };

        let ai_api_base = pick("LINGO_AI_API_BASE", &config.ai_api_base);
        let chat_backend = match pick("LINGO_BACKEND", &config.backend).as_deref() {
            Some(value) if value.eq_ignore_ascii_case("proxy") => ChatBackend::Proxy,
            Some(value) if value.eq_ignore_ascii_case("direct") => ChatBackend::Direct,
            _ if ai_api_base.is_some() => ChatBackend::Proxy,
            _ => ChatBackend::Direct,
        };

        let audio_api_base = var("LINGO_AUDIO_API_BASE")
            .or_else(|| var("LINGO_AUDIO_API_BASE_LOCAL"))
            .or_else(|| non_empty(config.audio_api_base.clone()));
        let audio_backend = match pick("LINGO_AUDIO_BACKEND", &config.audio_backend).as_deref() {
            Some(value) if value.eq_ignore_ascii_case("openai") => AudioBackend::OpenAi,
            Some(value) if value.eq_ignore_ascii_case("local") => AudioBackend::Local,
            _ if audio_api_base.is_some() => AudioBackend::Local,
            _ => AudioBackend::OpenAi,
        };

        let languages = match var("LINGO_LANGUAGES") {
            Some(list) => split_list(&list),
            None => config
                .languages
                .iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        };

        let mut default_models: HashMap<String, String> = config
            .default_models
            .iter()
            .map(|(provider, model)| (provider.to_lowercase(), model.clone()))
            .collect();
        let mut api_keys = HashMap::new();
        let mut base_urls: HashMap<String, String> = config
            .base_urls
            .iter()
            .map(|(provider, url)| (provider.to_lowercase(), url.clone()))
            .collect();

        for provider in load_builtin_providers() {
            if let Some(model) = provider.model_env.as_deref().and_then(&var) {
                default_models.insert(provider.id.clone(), model);
            }
            if let Some(key) = var(&provider.api_key_env) {
                api_keys.insert(provider.id.clone(), key);
            }
            if let Some(url) = provider.base_url_env.as_deref().and_then(&var) {
                base_urls.insert(provider.id.clone(), url);
            }
        }

        RuntimeConfig {
            chat_backend,
            ai_api_base,
            audio_backend,
            audio_api_base,
            stt_model: pick("LINGO_STT_MODEL", &config.stt_model),
            tts_model: pick("LINGO_TTS_MODEL", &config.tts_model),
            tts_format: pick("LINGO_TTS_FORMAT", &config.tts_format),
            default_voice: pick("LINGO_TTS_DEFAULT_VOICE", &config.default_voice),
            system_prompt: pick("LINGO_SYSTEM_PROMPT", &config.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            languages,
            default_provider: pick("LINGO_PROVIDER", &config.default_provider)
                .map(|p| p.to_lowercase()),
            default_models,
            api_keys,
            base_urls,
            log_endpoint: pick("LINGO_LOG_ENDPOINT", &config.log_endpoint),
            metrics_endpoint: pick("LINGO_METRICS_ENDPOINT", &config.metrics_endpoint),
            player: pick("LINGO_PLAYER", &config.player),
            silence_threshold: config
                .silence_threshold
                .filter(|t| *t > 0.0)
                .unwrap_or(DEFAULT_SILENCE_THRESHOLD),
            silence_duration: config
                .silence_duration_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SILENCE_DURATION),
        }
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys
            .get(&provider.to_lowercase())
            .map(String::as_str)
    }

    pub fn base_url_override(&self, provider: &str) -> Option<&str> {
        self.base_urls
            .get(&provider.to_lowercase())
            .map(String::as_str)
    }

    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.default_models
            .get(&provider.to_lowercase())
            .map(String::as_str)
    }
}

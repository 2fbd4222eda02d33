//! Chat backends behind one capability trait.
//!
//! The tutor asks a provider for four things: a reply, a feedback analysis, a
//! proficiency level and a goal list. [`connect`] picks the implementation:
//! a [`DirectProvider`] over an OpenAI-compatible or Anthropic client, or the
//! [`ProxyProvider`] when a self-hosted AI API holds the keys.

pub mod anthropic;
pub mod direct;
pub mod openai;
pub mod prompts;
pub mod proxy;

use async_trait::async_trait;
use std::fmt;

use crate::core::analysis::FeedbackAnalysis;
use crate::core::builtin_providers::find_builtin_provider;
use crate::core::config::{ChatBackend, RuntimeConfig};
use crate::core::error::TutorError;
use crate::core::message::Message;
use crate::core::state::{Mode, Proficiency, Settings};
use crate::core::store::StateKey;

pub use anthropic::AnthropicClient;
pub use direct::{CompletionClient, CompletionRequest, DirectProvider};
pub use openai::OpenAiClient;
pub use proxy::{HttpTransport, ProxyProvider, ProxyTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Groq,
        ProviderKind::Anthropic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Groq => "Groq",
            ProviderKind::Anthropic => "Anthropic",
        }
    }

    /// Case-insensitive; `claude` is accepted for Anthropic.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "groq" => Some(ProviderKind::Groq),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }

    /// Store key holding this provider's model name.
    pub fn model_key(self) -> StateKey {
        match self {
            ProviderKind::OpenAi => StateKey::OpenaiModel,
            ProviderKind::Groq => StateKey::GroqModel,
            ProviderKind::Anthropic => StateKey::AnthropicModel,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything a provider needs to know about the current settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorContext {
    pub provider: ProviderKind,
    pub model: String,
    pub system_prompt: String,
    pub language: String,
    pub mode: Mode,
}

impl TutorContext {
    /// Fails when no model is configured for the selected provider.
    pub fn resolve(settings: &Settings) -> Result<Self, TutorError> {
        let model = settings.current_model().trim();
        if model.is_empty() {
            return Err(TutorError::config(format!(
                "Model not configured: {}",
                settings.provider
            )));
        }
        Ok(TutorContext {
            provider: settings.provider,
            model: model.to_string(),
            system_prompt: settings.system_prompt.clone(),
            language: settings.language.clone(),
            mode: settings.mode,
        })
    }
}

#[async_trait]
pub trait TutorProvider: Send + Sync {
    /// Short label for logs and `/settings`.
    fn name(&self) -> String;

    async fn generate_reply(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<String, TutorError>;

    async fn analyze_text(
        &self,
        ctx: &TutorContext,
        text: &str,
    ) -> Result<FeedbackAnalysis, TutorError>;

    async fn detect_level(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Proficiency, TutorError>;

    async fn suggest_goals(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Vec<String>, TutorError>;
}

/// Credentials and endpoint for a direct vendor call.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderSession {
    pub provider: ProviderKind,
    pub api_key: String,
    pub base_url: String,
}

impl ProviderSession {
    pub fn resolve(provider: ProviderKind, runtime: &RuntimeConfig) -> Result<Self, TutorError> {
        let builtin = find_builtin_provider(provider.id()).ok_or_else(|| {
            TutorError::config(format!("Unsupported provider: {provider}"))
        })?;
        let api_key = runtime.api_key(provider.id()).ok_or_else(|| {
            TutorError::config(format!(
                "API key not configured for {}: set {}",
                builtin.display_name, builtin.api_key_env
            ))
        })?;
        let base_url = runtime
            .base_url_override(provider.id())
            .unwrap_or(&builtin.base_url);
        Ok(ProviderSession {
            provider,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }
}

/// Build the provider selected by `settings` and the configured backend.
pub fn connect(
    settings: &Settings,
    runtime: &RuntimeConfig,
    http: &reqwest::Client,
) -> Result<Box<dyn TutorProvider>, TutorError> {
    match runtime.chat_backend {
        ChatBackend::Proxy => {
            let base = runtime
                .ai_api_base
                .as_deref()
                .ok_or_else(|| TutorError::config("AI API base not configured"))?;
            Ok(Box::new(ProxyProvider::new(HttpTransport::new(
                http.clone(),
                base,
            ))))
        }
        ChatBackend::Direct => {
            let session = ProviderSession::resolve(settings.provider, runtime)?;
            match session.provider {
                ProviderKind::Anthropic => Ok(Box::new(DirectProvider::new(
                    AnthropicClient::new(http.clone(), session),
                ))),
                ProviderKind::OpenAi | ProviderKind::Groq => Ok(Box::new(DirectProvider::new(
                    OpenAiClient::new(http.clone(), session),
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests;

//! Built-in provider table
//!
//! The three chat backends the tutor can talk to directly, loaded from the
//! embedded `builtin_providers.toml`.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuiltinProvider {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    pub mode: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Environment variable overriding `base_url`
    pub base_url_env: Option<String>,
    /// Environment variable naming the default model
    pub model_env: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<BuiltinProvider>,
}

static BUILTIN_PROVIDERS: LazyLock<Vec<BuiltinProvider>> = LazyLock::new(|| {
    const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");
    match toml::from_str::<BuiltinProvidersConfig>(CONFIG_CONTENT) {
        Ok(config) => config.providers,
        Err(err) => {
            tracing::error!(error = %err, "embedded provider table is invalid");
            Vec::new()
        }
    }
});

impl BuiltinProvider {
    /// Wire protocol spoken by this provider
    pub fn api_mode(&self) -> &str {
        self.mode.as_deref().unwrap_or("openai")
    }

    pub fn is_anthropic_mode(&self) -> bool {
        self.api_mode() == "anthropic"
    }
}

pub fn load_builtin_providers() -> &'static [BuiltinProvider] {
    &BUILTIN_PROVIDERS
}

/// Find a built-in provider by ID (case-insensitive)
pub fn find_builtin_provider(id: &str) -> Option<&'static BuiltinProvider> {
    load_builtin_providers()
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

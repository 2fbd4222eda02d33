//! Provider-keyed setting handlers for `HashMap<String, String>` settings.

use std::collections::HashMap;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config, validate_provider};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::data::Config;

pub struct ProviderMapHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    unset_example: &'static str,
    map: fn(&Config) -> &HashMap<String, String>,
    map_mut: fn(&mut Config) -> &mut HashMap<String, String>,
}

impl SettingHandler for ProviderMapHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.len() < 2 {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let provider = validate_provider(&args[0])?.id();
        let value = args[1..].join(" ");
        let message = format!(
            "✅ Set {} for provider '{provider}' to: {value}",
            self.key
        );

        let map_mut = self.map_mut;
        mutate_config(ctx.config_path, move |config| {
            map_mut(config).insert(provider.to_string(), value);
        })?;
        Ok(message)
    }

    fn unset(&self, args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let provider = args.ok_or(SettingError::MissingArgs {
            hint: "Specify the provider to unset:",
            example: self.unset_example,
        })?;
        let provider = validate_provider(provider)?.id();
        if !(self.map)(ctx.config).contains_key(provider) {
            return Ok(format!("ℹ️  No {} set for provider: {provider}", self.key));
        }

        let map_mut = self.map_mut;
        mutate_config(ctx.config_path, move |config| {
            map_mut(config).remove(provider);
        })?;
        Ok(format!("✅ Unset {} for provider: {provider}", self.key))
    }

    fn format(&self, config: &Config) -> String {
        let map = (self.map)(config);
        if map.is_empty() {
            return format!("  {}: (none set)", self.key);
        }
        let mut output = format!("  {}:\n", self.key);
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by_key(|(k, _)| *k);
        for (provider, value) in entries {
            output.push_str(&format!("    {provider}: {value}\n"));
        }
        output.pop();
        output
    }
}

pub fn default_model_handler() -> ProviderMapHandler {
    ProviderMapHandler {
        key: "default-model",
        hint: "To set a default model, specify the provider and model:",
        example: "lingo set default-model openai gpt-4o-mini",
        unset_example: "lingo unset default-model openai",
        map: |c| &c.default_models,
        map_mut: |c| &mut c.default_models,
    }
}

pub fn base_url_handler() -> ProviderMapHandler {
    ProviderMapHandler {
        key: "base-url",
        hint: "To point a provider at another endpoint, specify the provider and URL:",
        example: "lingo set base-url openai http://localhost:8080/v1",
        unset_example: "lingo unset base-url openai",
        map: |c| &c.base_urls,
        map_mut: |c| &mut c.base_urls,
    }
}

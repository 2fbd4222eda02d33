//! Single-value settings that need validation.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    mutate_config_with_message, success_set, success_unset, validate_provider,
};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::data::Config;
use crate::core::config::runtime::{DEFAULT_SILENCE_DURATION, DEFAULT_SILENCE_THRESHOLD};

/// Handler for the `default-provider` setting.
pub struct DefaultProviderHandler;

impl SettingHandler for DefaultProviderHandler {
    fn key(&self) -> &'static str {
        "default-provider"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a default provider, specify the provider:",
                example: "lingo set default-provider groq",
            });
        }

        let provider = validate_provider(&args.join(" "))?.id();
        mutate_config_with_message(
            ctx.config_path,
            move |config| config.default_provider = Some(provider.to_string()),
            success_set("default-provider", provider),
        )
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.default_provider = None,
            success_unset("default-provider"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.default_provider {
            Some(provider) => format!("  default-provider: {provider}"),
            None => "  default-provider: (unset, default: openai)".to_string(),
        }
    }
}

/// One of a fixed set of words, stored lowercase.
pub struct ChoiceHandler {
    key: &'static str,
    choices: &'static [&'static str],
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<&str>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for ChoiceHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        };
        let value = input.trim().to_lowercase();
        if !self.choices.contains(&value.as_str()) {
            return Err(SettingError::InvalidChoice {
                key: self.key,
                input: input.clone(),
                choices: self.choices,
            });
        }

        let message = success_set(self.key, &value);
        let set_field = self.set_field;
        mutate_config_with_message(ctx.config_path, move |config| set_field(config, Some(value)), message)
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.config_path,
            move |config| set_field(config, None),
            format!("✅ Unset {} (will use default: {})", self.key, self.default_display),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

pub fn backend_handler() -> ChoiceHandler {
    ChoiceHandler {
        key: "backend",
        choices: &["direct", "proxy"],
        hint: "To choose how chat requests are sent, specify direct or proxy:",
        example: "lingo set backend proxy",
        default_display: "proxy when ai-api-base is set, else direct",
        get: |c| c.backend.as_deref(),
        set_field: |c, v| c.backend = v,
    }
}

pub fn audio_backend_handler() -> ChoiceHandler {
    ChoiceHandler {
        key: "audio-backend",
        choices: &["local", "openai"],
        hint: "To choose the speech service, specify local or openai:",
        example: "lingo set audio-backend local",
        default_display: "local when audio-api-base is set, else openai",
        get: |c| c.audio_backend.as_deref(),
        set_field: |c, v| c.audio_backend = v,
    }
}

/// Handler for the `silence-threshold` setting.
pub struct SilenceThresholdHandler;

impl SettingHandler for SilenceThresholdHandler {
    fn key(&self) -> &'static str {
        "silence-threshold"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the silence threshold, give an RMS level between 0 and 1:",
                example: "lingo set silence-threshold 0.02",
            });
        };
        let value = input
            .parse::<f32>()
            .ok()
            .filter(|v| *v > 0.0 && *v < 1.0)
            .ok_or_else(|| SettingError::InvalidNumber {
                key: "silence-threshold",
                input: input.clone(),
            })?;
        mutate_config_with_message(
            ctx.config_path,
            move |config| config.silence_threshold = Some(value),
            success_set("silence-threshold", &value.to_string()),
        )
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.silence_threshold = None,
            success_unset("silence-threshold"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.silence_threshold {
            Some(value) => format!("  silence-threshold: {value}"),
            None => format!("  silence-threshold: (unset, default: {DEFAULT_SILENCE_THRESHOLD})"),
        }
    }
}

/// Handler for the `silence-duration-ms` setting.
pub struct SilenceDurationHandler;

impl SettingHandler for SilenceDurationHandler {
    fn key(&self) -> &'static str {
        "silence-duration-ms"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set how much trailing silence ends a recording, give milliseconds:",
                example: "lingo set silence-duration-ms 1500",
            });
        };
        let value = input
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| SettingError::InvalidNumber {
                key: "silence-duration-ms",
                input: input.clone(),
            })?;
        mutate_config_with_message(
            ctx.config_path,
            move |config| config.silence_duration_ms = Some(value),
            success_set("silence-duration-ms", &value.to_string()),
        )
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.silence_duration_ms = None,
            success_unset("silence-duration-ms"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.silence_duration_ms {
            Some(value) => format!("  silence-duration-ms: {value}"),
            None => format!(
                "  silence-duration-ms: (unset, default: {})",
                DEFAULT_SILENCE_DURATION.as_millis()
            ),
        }
    }
}

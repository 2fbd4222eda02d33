//! Free-text settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    mutate_config_with_message, success_set, success_unset, truncate_with_ellipsis,
};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::data::Config;

/// Data-driven handler for optional string settings.
pub struct TextHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    get: fn(&Config) -> Option<&str>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for TextHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let value = args.join(" ").trim().to_string();
        if value.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let message = success_set(self.key, &truncate_with_ellipsis(&value, 50));
        let set_field = self.set_field;
        mutate_config_with_message(ctx.config_path, move |config| set_field(config, Some(value)), message)
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.config_path,
            move |config| set_field(config, None),
            success_unset(self.key),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => {
                let flat = value.replace('\n', " ");
                format!("  {}: {}", self.key, truncate_with_ellipsis(&flat, 50))
            }
            None => format!("  {}: (unset)", self.key),
        }
    }
}

pub fn text_handlers() -> Vec<TextHandler> {
    vec![
        TextHandler {
            key: "ai-api-base",
            hint: "To route chat through a proxy, give its base URL:",
            example: "lingo set ai-api-base http://localhost:3000",
            get: |c| c.ai_api_base.as_deref(),
            set_field: |c, v| c.ai_api_base = v,
        },
        TextHandler {
            key: "audio-api-base",
            hint: "To use a local audio API, give its base URL:",
            example: "lingo set audio-api-base http://localhost:3001",
            get: |c| c.audio_api_base.as_deref(),
            set_field: |c, v| c.audio_api_base = v,
        },
        TextHandler {
            key: "stt-model",
            hint: "To set the transcription model, give its name:",
            example: "lingo set stt-model whisper-1",
            get: |c| c.stt_model.as_deref(),
            set_field: |c, v| c.stt_model = v,
        },
        TextHandler {
            key: "tts-model",
            hint: "To set the speech model, give its name:",
            example: "lingo set tts-model tts-1",
            get: |c| c.tts_model.as_deref(),
            set_field: |c, v| c.tts_model = v,
        },
        TextHandler {
            key: "tts-format",
            hint: "To set the speech audio format, give a format name:",
            example: "lingo set tts-format mp3",
            get: |c| c.tts_format.as_deref(),
            set_field: |c, v| c.tts_format = v,
        },
        TextHandler {
            key: "default-voice",
            hint: "To set the voice used until you pick one, give its name:",
            example: "lingo set default-voice nova",
            get: |c| c.default_voice.as_deref(),
            set_field: |c, v| c.default_voice = v,
        },
        TextHandler {
            key: "system-prompt",
            hint: "To set the base tutor instructions, provide the text:",
            example: "lingo set system-prompt \"You are a patient tutor.\"",
            get: |c| c.system_prompt.as_deref(),
            set_field: |c, v| c.system_prompt = v,
        },
        TextHandler {
            key: "player",
            hint: "To hear replies, give a command that plays an audio file:",
            example: "lingo set player mpv --really-quiet",
            get: |c| c.player.as_deref(),
            set_field: |c, v| c.player = v,
        },
        TextHandler {
            key: "log-endpoint",
            hint: "To forward log lines, give the collector URL:",
            example: "lingo set log-endpoint http://localhost:4000/log",
            get: |c| c.log_endpoint.as_deref(),
            set_field: |c, v| c.log_endpoint = v,
        },
        TextHandler {
            key: "metrics-endpoint",
            hint: "To forward turn timings, give the collector URL:",
            example: "lingo set metrics-endpoint http://localhost:4000/metrics",
            get: |c| c.metrics_endpoint.as_deref(),
            set_field: |c, v| c.metrics_endpoint = v,
        },
    ]
}

/// Handler for the `languages` setting (comma or space separated).
pub struct LanguagesHandler;

impl SettingHandler for LanguagesHandler {
    fn key(&self) -> &'static str {
        "languages"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let languages: Vec<String> = args
            .iter()
            .flat_map(|arg| arg.split(','))
            .map(|item| item.trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect();
        if languages.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To limit the offered languages, list them:",
                example: "lingo set languages spanish,french,german",
            });
        }

        let message = success_set("languages", &languages.join(", "));
        mutate_config_with_message(ctx.config_path, move |config| config.languages = languages, message)
    }

    fn unset(&self, _args: Option<&str>, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.languages.clear(),
            success_unset("languages"),
        )
    }

    fn format(&self, config: &Config) -> String {
        if config.languages.is_empty() {
            "  languages: (unset, fetched from the audio API)".to_string()
        } else {
            format!("  languages: {}", config.languages.join(", "))
        }
    }
}

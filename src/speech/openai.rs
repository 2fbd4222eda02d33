//! OpenAI-compatible `audio/transcriptions` and `audio/speech`.

use async_trait::async_trait;
use reqwest::multipart;

use crate::api::{SpeechRequest, TranscriptionResponse};
use crate::core::builtin_providers::find_builtin_provider;
use crate::core::chat_stream::error_for_status;
use crate::core::config::RuntimeConfig;
use crate::core::error::TutorError;
use crate::core::languages::{self, LanguageOption};
use crate::speech::{CapturedAudio, SpeechService, SynthesizedAudio};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub const VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

const PROVIDER_ID: &str = "openai";

pub struct OpenAiAudio {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    stt_model: Option<String>,
    tts_model: Option<String>,
    tts_format: Option<String>,
}

impl OpenAiAudio {
    pub fn from_runtime(runtime: &RuntimeConfig, http: reqwest::Client) -> Self {
        let base_url = runtime
            .base_url_override(PROVIDER_ID)
            .map(str::to_string)
            .or_else(|| find_builtin_provider(PROVIDER_ID).map(|p| p.base_url.clone()))
            .unwrap_or_default();
        Self {
            http,
            base_url,
            api_key: runtime.api_key(PROVIDER_ID).map(str::to_string),
            stt_model: runtime.stt_model.clone(),
            tts_model: runtime.tts_model.clone(),
            tts_format: runtime.tts_format.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, TutorError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("API key not configured for OpenAI audio: set OPENAI_API_KEY"))
    }
}

#[async_trait]
impl SpeechService for OpenAiAudio {
    fn name(&self) -> &str {
        "openai"
    }

    async fn transcribe(
        &self,
        audio: &CapturedAudio,
        language_code: &str,
    ) -> Result<String, TutorError> {
        let api_key = self.api_key()?;
        let model = self
            .stt_model
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("STT model not configured"))?;
        let url = construct_api_url(&self.base_url, "audio/transcriptions");

        let part = multipart::Part::bytes(audio.wav.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| TutorError::network(&url, e))?;
        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string());
        if !language_code.trim().is_empty() {
            form = form.text("language", language_code.to_string());
        }

        let request = add_auth_headers(self.http.post(&url), PROVIDER_ID, api_key);
        let response = request
            .multipart(form)
            .send()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        let response = error_for_status(response, &url).await?;
        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TutorError::invalid_response(&url, e.to_string()))?;
        Ok(body.text)
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedAudio, TutorError> {
        let api_key = self.api_key()?;
        let model = self
            .tts_model
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("TTS model not configured"))?;
        let format = self
            .tts_format
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("TTS format not configured"))?;
        let voice = if voice.trim().is_empty() { VOICES[0] } else { voice };
        let url = construct_api_url(&self.base_url, "audio/speech");

        let request = add_auth_headers(self.http.post(&url), PROVIDER_ID, api_key);
        let response = request
            .json(&SpeechRequest {
                model,
                voice,
                input: text,
                response_format: format,
            })
            .send()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        let response = error_for_status(response, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            format: format.to_string(),
        })
    }

    async fn voices(&self) -> Result<Vec<String>, TutorError> {
        Ok(VOICES.iter().map(|v| v.to_string()).collect())
    }

    async fn languages(&self) -> Result<Vec<LanguageOption>, TutorError> {
        Ok(languages::builtin_languages())
    }

    async fn health(&self) -> Vec<String> {
        let key = if self.api_key.is_some() {
            "configured"
        } else {
            "missing"
        };
        vec![
            format!("audio_base:{}", self.base_url),
            format!("api_key:{key}"),
        ]
    }
}

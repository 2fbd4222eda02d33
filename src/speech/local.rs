//! The locally hosted audio API: `/transcribe`, `/tts`, `/voices`, `/languages`.

use async_trait::async_trait;
use reqwest::multipart;
use tracing::debug;

use crate::api::{SpeechRequest, TranscriptionResponse};
use crate::core::chat_stream::error_for_status;
use crate::core::config::RuntimeConfig;
use crate::core::error::TutorError;
use crate::core::languages::{self, LanguageOption};
use crate::speech::{CapturedAudio, SpeechService, SynthesizedAudio};
use crate::utils::url::construct_api_url;

pub struct LocalAudioApi {
    http: reqwest::Client,
    base: Option<String>,
    stt_model: Option<String>,
    tts_model: Option<String>,
    tts_format: Option<String>,
}

impl LocalAudioApi {
    pub fn from_runtime(runtime: &RuntimeConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base: runtime.audio_api_base.clone(),
            stt_model: runtime.stt_model.clone(),
            tts_model: runtime.tts_model.clone(),
            tts_format: runtime.tts_format.clone(),
        }
    }

    fn base(&self) -> Result<&str, TutorError> {
        self.base
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("Audio API base not configured"))
    }

    /// GET `path`, returning the URL alongside the body for error reporting.
    async fn get_text(&self, path: &str) -> Result<(String, String), TutorError> {
        let url = construct_api_url(self.base()?, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        let response = error_for_status(response, &url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        Ok((url, body))
    }

    async fn probe(&self, base: &str, path: &str) -> String {
        let url = construct_api_url(base, path);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().as_u16().to_string(),
            Err(err) => {
                debug!(url = %url, error = %err, "health probe failed");
                "unreachable".to_string()
            }
        }
    }
}

#[async_trait]
impl SpeechService for LocalAudioApi {
    fn name(&self) -> &str {
        "local"
    }

    async fn transcribe(
        &self,
        audio: &CapturedAudio,
        language_code: &str,
    ) -> Result<String, TutorError> {
        let base = self.base()?;
        let model = self
            .stt_model
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("STT model not configured"))?;
        let url = construct_api_url(base, "transcribe");

        let part = multipart::Part::bytes(audio.wav.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| TutorError::network(&url, e))?;
        let language = if language_code.trim().is_empty() {
            languages::FALLBACK_CODE
        } else {
            language_code
        };
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string())
            .text("language", language.to_string());

        let response = self
            .http
            .post(&url)
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
        let base = self.base()?;
        let model = self
            .tts_model
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("TTS model not configured"))?;
        let format = self
            .tts_format
            .as_deref()
            .ok_or_else(|| TutorError::audio_config("TTS format not configured"))?;
        let url = construct_api_url(base, "tts");

        let response = self
            .http
            .post(&url)
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
        let (url, body) = self.get_text("voices").await?;
        serde_json::from_str(&body).map_err(|e| TutorError::invalid_response(url, e.to_string()))
    }

    async fn languages(&self) -> Result<Vec<LanguageOption>, TutorError> {
        let (url, body) = self.get_text("languages").await?;
        languages::parse_payload(&body).map_err(|e| TutorError::invalid_response(url, e.to_string()))
    }

    async fn health(&self) -> Vec<String> {
        let Some(base) = self.base.as_deref() else {
            return vec!["audio_base:not_configured".to_string()];
        };
        vec![
            format!("voices:{}", self.probe(base, "voices").await),
            format!("languages:{}", self.probe(base, "languages").await),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::time::Duration;

    fn api(config: Config) -> LocalAudioApi {
        LocalAudioApi::from_runtime(
            &RuntimeConfig::resolve(&config, |_| None),
            reqwest::Client::new(),
        )
    }

    fn audio() -> CapturedAudio {
        CapturedAudio {
            wav: vec![0; 44],
            sample_rate: 16_000,
            duration: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn missing_base_is_reported_before_any_request() {
        let api = api(Config::default());
        let err = api.transcribe(&audio(), "es").await.unwrap_err();
        assert_eq!(err.user_message(), "Audio API base not configured");
        assert!(err.is_config());
        assert_eq!(api.health().await, vec!["audio_base:not_configured"]);
    }

    #[tokio::test]
    async fn missing_models_and_format_are_configuration_errors() {
        let base = Config {
            audio_api_base: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let err = api(base.clone()).transcribe(&audio(), "es").await.unwrap_err();
        assert_eq!(err.user_message(), "STT model not configured");

        let err = api(base.clone()).synthesize("hola", "alloy").await.unwrap_err();
        assert_eq!(err.user_message(), "TTS model not configured");

        let err = api(Config {
            tts_model: Some("tts-1".to_string()),
            ..base
        })
        .synthesize("hola", "alloy")
        .await
        .unwrap_err();
        assert_eq!(err.user_message(), "TTS format not configured");
    }
}

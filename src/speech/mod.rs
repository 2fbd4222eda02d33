//! Speech I/O: capture, transcription, synthesis, playback and barge-in.
//!
//! Transcription and synthesis go through a [`SpeechService`]; which one is
//! chosen by [`connect`] from the configured audio backend. Configuration
//! problems surface when a call is made, not when the service is built, so a
//! tutor without any audio setup still works for text.

pub mod local;
pub mod monitor;
pub mod openai;
pub mod playback;
pub mod recorder;

use async_trait::async_trait;
use std::time::Duration;

use crate::core::config::{AudioBackend, RuntimeConfig};
use crate::core::error::TutorError;
use crate::core::languages::LanguageOption;

pub use local::LocalAudioApi;
pub use monitor::{EnergySource, InterruptionMonitor, MonitorConfig, MonitorEvent};
pub use openai::OpenAiAudio;
pub use playback::{AudioOutput, ExternalPlayer, PlaybackHandle};
pub use recorder::{AudioSource, Recorder, RecorderConfig, WavFileSource};

/// A finished recording, WAV encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    /// Container/codec name as sent in `response_format` (`mp3`, `wav`, ...)
    pub format: String,
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(
        &self,
        audio: &CapturedAudio,
        language_code: &str,
    ) -> Result<String, TutorError>;

    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedAudio, TutorError>;

    async fn voices(&self) -> Result<Vec<String>, TutorError>;

    async fn languages(&self) -> Result<Vec<LanguageOption>, TutorError>;

    /// One `name:status` line per probed endpoint.
    async fn health(&self) -> Vec<String>;
}

pub fn connect(runtime: &RuntimeConfig, http: &reqwest::Client) -> Box<dyn SpeechService> {
    match runtime.audio_backend {
        AudioBackend::Local => Box::new(LocalAudioApi::from_runtime(runtime, http.clone())),
        AudioBackend::OpenAi => Box::new(OpenAiAudio::from_runtime(runtime, http.clone())),
    }
}

/// The configured voice, or the first available one when none is set.
pub fn pick_voice(current: &str, available: &[String]) -> Option<String> {
    if !current.trim().is_empty() {
        return None;
    }
    available.first().cloned()
}

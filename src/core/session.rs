//! The running tutor: state, persistence and the adapters a turn needs.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::core::config::RuntimeConfig;
use crate::core::error::TutorError;
use crate::core::languages::{self, LanguageOption};
use crate::core::state::{AppState, LEARNING_KEYS};
use crate::core::store::{StateKey, StateStore};
use crate::core::turn::{TurnDeps, TurnError, TurnOutcome, TurnPipeline, TurnStep};
use crate::providers::{self, ProviderKind, TutorProvider};
use crate::speech::{
    self, AudioOutput, ExternalPlayer, MonitorConfig, Recorder, RecorderConfig, SpeechService,
    WavFileSource,
};
use crate::utils::logging::RemoteLog;

pub struct TutorSession {
    pub state: AppState,
    pub store: StateStore,
    pub runtime: RuntimeConfig,
    pub languages: Vec<LanguageOption>,
    pub voices: Vec<String>,
    http: reqwest::Client,
    provider: Option<Box<dyn TutorProvider>>,
    speech: Box<dyn SpeechService>,
    player: Option<ExternalPlayer>,
    pipeline: TurnPipeline,
    remote: RemoteLog,
    notices: Vec<String>,
}

impl TutorSession {
    pub fn new(store: StateStore, runtime: RuntimeConfig, http: reqwest::Client) -> Self {
        let state = AppState::load(&store, &runtime);
        let speech = speech::connect(&runtime, &http);
        let player = runtime
            .player
            .as_deref()
            .and_then(ExternalPlayer::from_command_line);
        let remote = RemoteLog::new(http.clone(), &runtime);
        let languages = languages::resolve(&runtime.languages, None);

        Self {
            state,
            store,
            runtime,
            languages,
            voices: Vec::new(),
            http,
            provider: None,
            speech,
            player,
            pipeline: TurnPipeline::new(Utc::now()),
            remote,
            notices: Vec::new(),
        }
    }

    /// Fetch the language and voice lists, then settle the language and voice
    /// selections against them. Lookup failures fall back and are only logged.
    pub async fn bootstrap(&mut self) {
        if self.runtime.languages.is_empty() {
            let fetched = match self.speech.languages().await {
                Ok(list) => Some(list),
                Err(err) => {
                    warn!(error = %err, "language list unavailable; using built-in list");
                    None
                }
            };
            self.languages = languages::resolve(&self.runtime.languages, fetched);
        }
        if self
            .state
            .ensure_language(&self.languages, &languages::system_locale_base())
        {
            info!(language = %self.state.settings.language, "language chosen from locale");
            self.persist(&[StateKey::Language]);
        }

        match self.speech.voices().await {
            Ok(voices) => self.voices = voices,
            Err(err) => warn!(error = %err, "voice list unavailable"),
        }
        if let Some(voice) = speech::pick_voice(&self.state.settings.tts_voice, &self.voices) {
            debug!(%voice, "selecting first available voice");
            self.state.settings.tts_voice = voice;
            self.persist(&[StateKey::TtsVoice]);
        }

        if self.state.settings.tts_enabled && self.player.is_none() {
            warn!("no audio player configured (LINGO_PLAYER); replies will not be spoken");
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Write `keys` back to the store. Failures become a notice.
    pub fn persist(&mut self, keys: &[StateKey]) -> bool {
        match self.state.persist_all(&mut self.store, keys) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "failed to persist state");
                self.notify(format!("Could not save: {err}"));
                false
            }
        }
    }

    /// Apply `change` to the state and persist `keys`.
    pub fn update<F>(&mut self, keys: &[StateKey], change: F) -> bool
    where
        F: FnOnce(&mut AppState),
    {
        change(&mut self.state);
        self.persist(keys)
    }

    pub fn set_provider(&mut self, kind: ProviderKind) {
        self.update(&[StateKey::ApiProvider], |state| state.settings.provider = kind);
        self.provider = None;
    }

    /// Use `provider` for subsequent turns instead of connecting from settings.
    pub fn use_provider(&mut self, provider: Box<dyn TutorProvider>) {
        self.provider = Some(provider);
    }

    pub fn use_speech(&mut self, speech: Box<dyn SpeechService>) {
        self.speech = speech;
    }

    pub fn speech(&self) -> &dyn SpeechService {
        self.speech.as_ref()
    }

    pub fn player(&self) -> Option<&ExternalPlayer> {
        self.player.as_ref()
    }

    pub fn remote(&self) -> &RemoteLog {
        &self.remote
    }

    pub fn language_code(&self) -> String {
        languages::language_code(&self.languages, &self.state.settings.language)
    }

    /// Forget the conversation and all derived learning data.
    pub fn reset_learning(&mut self) -> bool {
        self.update(&LEARNING_KEYS, AppState::reset_learning)
    }

    /// Run one turn. `Ok(None)` when the send was dropped by the gate.
    pub async fn send(&mut self, text: &str) -> Result<Option<TurnOutcome>, TurnError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        if self.provider.is_none() {
            let connected = providers::connect(&self.state.settings, &self.runtime, &self.http)
                .map_err(|source| TurnError {
                    step: TurnStep::Prepare,
                    source,
                });
            match connected {
                Ok(provider) => self.provider = Some(provider),
                Err(err) => {
                    self.report_failure(&err).await;
                    return Err(err);
                }
            }
        }
        let Some(provider) = self.provider.as_deref() else {
            return Ok(None);
        };

        let output = self
            .player
            .as_ref()
            .map(|player| player as &dyn AudioOutput);
        let deps = TurnDeps {
            provider,
            speech: Some(self.speech.as_ref()),
            output,
            // No microphone capture here, so playback is never interrupted.
            energy: None,
            monitor: MonitorConfig::new(
                self.runtime.silence_threshold,
                self.runtime.silence_duration,
            ),
        };

        let started = Instant::now();
        let result = self
            .pipeline
            .send(&mut self.state, &mut self.store, text, deps, started)
            .await;

        let provider_id = self.state.settings.provider.id();
        let model = self.state.settings.current_model().to_string();
        match &result {
            Ok(Some(outcome)) => {
                self.remote
                    .turn(provider_id, &model, outcome.elapsed, true)
                    .await;
            }
            Ok(None) => {}
            Err(err) => {
                self.remote
                    .turn(provider_id, &model, started.elapsed(), false)
                    .await;
                self.report_failure(err).await;
            }
        }
        result
    }

    async fn report_failure(&self, err: &TurnError) {
        error!(step = %err.step, error = %err.source, "Message send failed");
        self.remote
            .log(&format!("Message send failed: {}", err.source))
            .await;
    }

    /// Read a WAV file as if it were a microphone take and transcribe it in
    /// the selected language.
    pub async fn transcribe_file(&self, path: &Path) -> Result<String, TutorError> {
        let mut source = WavFileSource::open(path)?;
        let config = RecorderConfig {
            auto_stop: true,
            silence_threshold: self.runtime.silence_threshold,
            silence_duration: self.runtime.silence_duration,
        };
        let captured = Recorder::record(&mut source, config)?;
        let text = self
            .speech
            .transcribe(&captured, &self.language_code())
            .await?;
        Ok(text.trim().to_string())
    }

    pub async fn health(&self) -> Vec<String> {
        self.speech.health().await
    }
}

//! One conversational turn, from user text to updated progress.
//!
//! The pipeline is strictly sequential and never rolls back: when a step
//! fails, everything applied before it stays applied and persisted.

use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::error::TutorError;
use crate::core::message::Message;
use crate::core::progress::{self, ProgressUpdate, TurnMetrics};
use crate::core::state::{AppState, Proficiency};
use crate::core::store::{StateKey, StateStore};
use crate::providers::{TutorContext, TutorProvider};
use crate::speech::{
    AudioOutput, EnergySource, InterruptionMonitor, MonitorConfig, SpeechService,
};

pub const MIN_SEND_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    Empty,
    InFlight,
    TooSoon { wait: Duration },
}

impl fmt::Display for SendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejection::Empty => write!(f, "empty message"),
            SendRejection::InFlight => write!(f, "a message is already being sent"),
            SendRejection::TooSoon { wait } => {
                write!(f, "sent too soon; wait {} ms", wait.as_millis())
            }
        }
    }
}

/// Admission control for sends: non-empty, one at a time, rate limited.
#[derive(Debug, Default)]
pub struct SendGate {
    in_flight: bool,
    last_accepted: Option<Instant>,
}

impl SendGate {
    pub fn try_begin(&mut self, text: &str, now: Instant) -> Result<(), SendRejection> {
        if text.trim().is_empty() {
            return Err(SendRejection::Empty);
        }
        if self.in_flight {
            return Err(SendRejection::InFlight);
        }
        if let Some(last) = self.last_accepted {
            let since = now.saturating_duration_since(last);
            if since < MIN_SEND_INTERVAL {
                return Err(SendRejection::TooSoon {
                    wait: MIN_SEND_INTERVAL - since,
                });
            }
        }
        self.in_flight = true;
        self.last_accepted = Some(now);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStep {
    Prepare,
    Persist,
    Reply,
    Speech,
    Feedback,
    Goals,
    Proficiency,
}

impl fmt::Display for TurnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnStep::Prepare => "prepare",
            TurnStep::Persist => "persist",
            TurnStep::Reply => "reply",
            TurnStep::Speech => "speech",
            TurnStep::Feedback => "feedback",
            TurnStep::Goals => "goals",
            TurnStep::Proficiency => "proficiency",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct TurnError {
    pub step: TurnStep,
    pub source: TutorError,
}

impl TurnError {
    fn at(step: TurnStep) -> impl FnOnce(TutorError) -> TurnError {
        move |source| TurnError { step, source }
    }

    fn persist(source: impl Into<TutorError>) -> TurnError {
        TurnError {
            step: TurnStep::Persist,
            source: source.into(),
        }
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn failed at {}: {}", self.step, self.source)
    }
}

impl StdError for TurnError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// Collaborators for one turn.
pub struct TurnDeps<'a> {
    pub provider: &'a dyn TutorProvider,
    /// Speech is attempted only when both a service and an output are present
    /// and TTS is enabled in the settings.
    pub speech: Option<&'a dyn SpeechService>,
    pub output: Option<&'a dyn AudioOutput>,
    /// Microphone energy for barge-in during playback. Without a source,
    /// playback always runs to completion and `interrupted` stays false.
    /// The interactive loop has no live microphone and passes `None`.
    pub energy: Option<Box<dyn EnergySource>>,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub feedback: String,
    pub error_categories: Vec<String>,
    pub progress: ProgressUpdate,
    pub goals_updated: bool,
    pub proficiency: Proficiency,
    /// Playback was cut short by the user speaking. The caller restarts
    /// capture; the chat loop asks for a `/record` file.
    pub interrupted: bool,
    pub elapsed: Duration,
}

enum PlaybackOutcome {
    Finished(Result<(), TutorError>),
    Interrupted,
}

pub struct TurnPipeline {
    gate: SendGate,
    session_start: DateTime<Utc>,
}

impl TurnPipeline {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            gate: SendGate::default(),
            session_start,
        }
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// Run one turn. `Ok(None)` means the gate rejected the send and nothing happened.
    pub async fn send(
        &mut self,
        state: &mut AppState,
        store: &mut StateStore,
        text: &str,
        deps: TurnDeps<'_>,
        now: Instant,
    ) -> Result<Option<TurnOutcome>, TurnError> {
        if let Err(rejection) = self.gate.try_begin(text, now) {
            debug!(%rejection, "send dropped");
            return Ok(None);
        }

        let result = self.run(state, store, text.trim(), deps).await;
        self.gate.finish();
        result.map(Some)
    }

    async fn run(
        &self,
        state: &mut AppState,
        store: &mut StateStore,
        text: &str,
        deps: TurnDeps<'_>,
    ) -> Result<TurnOutcome, TurnError> {
        let started = Instant::now();
        let ctx = TutorContext::resolve(&state.settings).map_err(TurnError::at(TurnStep::Prepare))?;
        info!(
            provider = %deps.provider.name(),
            model = %ctx.model,
            language = %ctx.language,
            "turn started"
        );

        state.push_message(Message::user(text));
        state
            .persist(store, StateKey::Messages)
            .map_err(TurnError::persist)?;

        let reply = deps
            .provider
            .generate_reply(&ctx, &state.messages)
            .await
            .map_err(TurnError::at(TurnStep::Reply))?;
        state.push_message(Message::tutor(reply.clone()));
        state
            .persist(store, StateKey::Messages)
            .map_err(TurnError::persist)?;

        let mut interrupted = false;
        if state.settings.tts_enabled {
            if let (Some(speech), Some(output)) = (deps.speech, deps.output) {
                interrupted = speak(
                    speech,
                    output,
                    &reply,
                    &state.settings.tts_voice,
                    deps.energy,
                    deps.monitor,
                )
                .await
                .map_err(TurnError::at(TurnStep::Speech))?;
            }
        }

        let analysis = deps
            .provider
            .analyze_text(&ctx, text)
            .await
            .map_err(TurnError::at(TurnStep::Feedback))?;
        let feedback = analysis.summary();
        let error_categories = analysis.categories();
        state.push_feedback(feedback.clone());
        state.merge_errors(error_categories.iter().map(String::as_str));
        state
            .persist_all(store, &[StateKey::Feedback, StateKey::CommonErrors])
            .map_err(TurnError::persist)?;

        let update = progress::advance(
            &state.progress,
            TurnMetrics {
                user_text: text,
                error_count: analysis.error_count(),
                message_count: state.messages.len(),
                language: &state.settings.language,
                session_start: self.session_start,
                now: Utc::now(),
            },
        );
        state.apply_progress(&update);
        state
            .persist_all(
                store,
                &[
                    StateKey::Progress,
                    StateKey::ProgressHistory,
                    StateKey::Journal,
                ],
            )
            .map_err(TurnError::persist)?;

        let goals = deps
            .provider
            .suggest_goals(&ctx, &state.messages)
            .await
            .map_err(TurnError::at(TurnStep::Goals))?;
        let goals_updated = state.replace_goals(goals);
        if goals_updated {
            state
                .persist(store, StateKey::Goals)
                .map_err(TurnError::persist)?;
        }

        let proficiency = deps
            .provider
            .detect_level(&ctx, &state.messages)
            .await
            .map_err(TurnError::at(TurnStep::Proficiency))?;
        state.proficiency = proficiency;
        state
            .persist(store, StateKey::Proficiency)
            .map_err(TurnError::persist)?;

        let elapsed = started.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            vocabulary = update.vocabulary_delta,
            grammar = update.grammar_delta,
            interrupted,
            "turn completed"
        );

        Ok(TurnOutcome {
            reply,
            feedback,
            error_categories,
            progress: update,
            goals_updated,
            proficiency,
            interrupted,
            elapsed,
        })
    }
}

/// Synthesize and play `text`. Returns true when the user spoke over it.
async fn speak(
    speech: &dyn SpeechService,
    output: &dyn AudioOutput,
    text: &str,
    voice: &str,
    energy: Option<Box<dyn EnergySource>>,
    monitor_config: MonitorConfig,
) -> Result<bool, TutorError> {
    let audio = speech.synthesize(text, voice).await?;
    let mut playback = output.start(&audio).await?;

    let Some(source) = energy else {
        playback.wait().await?;
        return Ok(false);
    };

    let mut monitor = InterruptionMonitor::spawn(source, monitor_config);
    let outcome = tokio::select! {
        result = playback.wait() => PlaybackOutcome::Finished(result),
        _ = monitor.wait_for_speech() => PlaybackOutcome::Interrupted,
    };
    monitor.stop();

    match outcome {
        PlaybackOutcome::Finished(result) => result.map(|_| false),
        PlaybackOutcome::Interrupted => {
            debug!("playback interrupted by speech");
            playback.stop().await;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests;

use super::*;
use crate::core::languages::LanguageOption;
use crate::speech::{CapturedAudio, PlaybackHandle, SynthesizedAudio};
use crate::utils::test_utils::{test_runtime, RecordingProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, StateStore, AppState) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = StateStore::open(temp_dir.path().join("state.json")).expect("store should open");
    let mut state = AppState::load(&store, &test_runtime());
    state.settings.openai_model = "gpt-test".to_string();
    (temp_dir, store, state)
}

fn deps(provider: &RecordingProvider) -> TurnDeps<'_> {
    TurnDeps {
        provider,
        speech: None,
        output: None,
        energy: None,
        monitor: MonitorConfig::new(0.1, Duration::from_millis(100)),
    }
}

#[derive(Default)]
struct CountingSpeech {
    synthesized: AtomicUsize,
}

#[async_trait]
impl SpeechService for CountingSpeech {
    fn name(&self) -> &str {
        "counting"
    }

    async fn transcribe(&self, _audio: &CapturedAudio, _code: &str) -> Result<String, TutorError> {
        Ok(String::new())
    }

    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<SynthesizedAudio, TutorError> {
        self.synthesized.fetch_add(1, Ordering::SeqCst);
        Ok(SynthesizedAudio {
            bytes: vec![0; 4],
            format: "mp3".to_string(),
        })
    }

    async fn voices(&self) -> Result<Vec<String>, TutorError> {
        Ok(Vec::new())
    }

    async fn languages(&self) -> Result<Vec<LanguageOption>, TutorError> {
        Ok(Vec::new())
    }

    async fn health(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Playback that either ends immediately or runs until stopped.
struct FakeOutput {
    endless: bool,
    stopped: Arc<AtomicBool>,
}

struct FakePlayback {
    endless: bool,
    stopped: Arc<AtomicBool>,
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn start(&self, _audio: &SynthesizedAudio) -> Result<Box<dyn PlaybackHandle>, TutorError> {
        Ok(Box::new(FakePlayback {
            endless: self.endless,
            stopped: self.stopped.clone(),
        }))
    }
}

#[async_trait]
impl PlaybackHandle for FakePlayback {
    async fn wait(&mut self) -> Result<(), TutorError> {
        if self.endless {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct LoudMicrophone;

impl EnergySource for LoudMicrophone {
    fn level(&mut self) -> Option<f32> {
        Some(0.5)
    }
}

#[test]
fn gate_rejects_empty_concurrent_and_rapid_sends() {
    let mut gate = SendGate::default();
    let start = Instant::now();

    assert_eq!(gate.try_begin("   ", start), Err(SendRejection::Empty));
    assert!(!gate.is_in_flight());
    assert_eq!(gate.try_begin("hola", start), Ok(()));
    assert!(gate.is_in_flight());
    assert_eq!(gate.try_begin("otra", start), Err(SendRejection::InFlight));

    gate.finish();
    assert!(!gate.is_in_flight());
    let soon = start + Duration::from_millis(500);
    assert_eq!(
        gate.try_begin("otra", soon),
        Err(SendRejection::TooSoon {
            wait: Duration::from_millis(1000)
        })
    );
    assert_eq!(gate.try_begin("otra", start + MIN_SEND_INTERVAL), Ok(()));
}

#[tokio::test]
async fn successful_turn_updates_and_persists_everything() {
    let (temp_dir, mut store, mut state) = setup();
    let mut provider = RecordingProvider::new("¡Muy bien! ¿Y tú?");
    provider.feedback =
        r#"{"comments":["Good try."],"errors":[{"type":"Verb","note":"use estoy"}]}"#.to_string();
    provider.level = Proficiency::Intermediate;
    provider.goals = vec!["Practice ser vs estar".to_string()];
    let mut pipeline = TurnPipeline::new(Utc::now());

    let outcome = pipeline
        .send(&mut state, &mut store, "  Yo soy cansado hoy  ", deps(&provider), Instant::now())
        .await
        .expect("turn should succeed")
        .expect("send should be accepted");

    assert_eq!(outcome.reply, "¡Muy bien! ¿Y tú?");
    assert_eq!(outcome.error_categories, vec!["verb"]);
    assert!(outcome.goals_updated);
    assert!(!outcome.interrupted);
    assert_eq!(
        provider.calls(),
        vec!["generate_reply", "analyze_text", "suggest_goals", "detect_level"]
    );

    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].content, "Yo soy cansado hoy");
    assert_eq!(state.feedback.len(), 1);
    assert_eq!(state.common_errors.get("verb"), Some(&1));
    assert_eq!(state.progress_history.len(), 1);
    assert_eq!(state.proficiency, Proficiency::Intermediate);
    assert_eq!(state.goals, vec!["Practice ser vs estar"]);

    let reopened = StateStore::open(temp_dir.path().join("state.json")).expect("store should reopen");
    let restored = AppState::load(&reopened, &test_runtime());
    assert_eq!(restored.messages, state.messages);
    assert_eq!(restored.progress, state.progress);
    assert_eq!(restored.goals, state.goals);
    assert_eq!(restored.proficiency, Proficiency::Intermediate);
    assert_eq!(restored.common_errors, state.common_errors);
}

#[tokio::test]
async fn missing_model_fails_before_anything_is_appended() {
    let (_temp_dir, mut store, mut state) = setup();
    state.settings.openai_model.clear();
    let provider = RecordingProvider::new("unused");
    let mut pipeline = TurnPipeline::new(Utc::now());

    let err = pipeline
        .send(&mut state, &mut store, "hola", deps(&provider), Instant::now())
        .await
        .expect_err("turn should fail");

    assert_eq!(err.step, TurnStep::Prepare);
    assert!(err.source.is_config());
    assert!(provider.calls().is_empty());
    assert!(state.messages.is_empty());
    assert!(!store.contains(StateKey::Messages));
}

#[tokio::test]
async fn reply_failure_keeps_the_user_message() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::failing(500);
    let mut pipeline = TurnPipeline::new(Utc::now());

    let err = pipeline
        .send(&mut state, &mut store, "hola", deps(&provider), Instant::now())
        .await
        .expect_err("turn should fail");

    assert_eq!(err.step, TurnStep::Reply);
    assert_eq!(provider.calls(), vec!["generate_reply"]);
    assert_eq!(state.messages.len(), 1);
    assert!(state.messages[0].is_user());
    assert!(state.feedback.is_empty());
    assert!(store.contains(StateKey::Messages));
}

#[tokio::test]
async fn gate_is_released_after_a_failed_turn() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::failing(503);
    let mut pipeline = TurnPipeline::new(Utc::now());
    let start = Instant::now();

    assert!(pipeline
        .send(&mut state, &mut store, "uno", deps(&provider), start)
        .await
        .is_err());

    let retry = pipeline
        .send(&mut state, &mut store, "dos", deps(&provider), start + MIN_SEND_INTERVAL)
        .await;
    assert!(retry.is_err(), "second send should reach the provider again");
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn rejected_sends_have_no_side_effects() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::new("Hola");
    let mut pipeline = TurnPipeline::new(Utc::now());
    let start = Instant::now();

    let empty = pipeline
        .send(&mut state, &mut store, "  ", deps(&provider), start)
        .await
        .expect("empty send is not an error");
    assert!(empty.is_none());

    pipeline
        .send(&mut state, &mut store, "hola", deps(&provider), start)
        .await
        .expect("turn should succeed")
        .expect("send should be accepted");
    let calls_after_first = provider.calls().len();

    let rapid = pipeline
        .send(&mut state, &mut store, "otra vez", deps(&provider), start + Duration::from_millis(200))
        .await
        .expect("rapid send is not an error");
    assert!(rapid.is_none());
    assert_eq!(provider.calls().len(), calls_after_first);
    assert_eq!(state.messages.len(), 2);
}

#[tokio::test]
async fn empty_goal_suggestion_keeps_current_goals() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::new("Hola");
    let before = state.goals.clone();
    let mut pipeline = TurnPipeline::new(Utc::now());

    let outcome = pipeline
        .send(&mut state, &mut store, "hola", deps(&provider), Instant::now())
        .await
        .expect("turn should succeed")
        .expect("send should be accepted");

    assert!(!outcome.goals_updated);
    assert_eq!(state.goals, before);
}

#[tokio::test]
async fn speech_is_skipped_when_tts_is_disabled() {
    let (_temp_dir, mut store, mut state) = setup();
    state.settings.tts_enabled = false;
    let provider = RecordingProvider::new("Hola");
    let speech = CountingSpeech::default();
    let output = FakeOutput {
        endless: false,
        stopped: Arc::default(),
    };
    let mut pipeline = TurnPipeline::new(Utc::now());

    let turn_deps = TurnDeps {
        speech: Some(&speech),
        output: Some(&output),
        ..deps(&provider)
    };
    pipeline
        .send(&mut state, &mut store, "hola", turn_deps, Instant::now())
        .await
        .expect("turn should succeed");

    assert_eq!(speech.synthesized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn finished_playback_is_not_an_interruption() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::new("Hola");
    let speech = CountingSpeech::default();
    let output = FakeOutput {
        endless: false,
        stopped: Arc::default(),
    };
    let mut pipeline = TurnPipeline::new(Utc::now());

    let turn_deps = TurnDeps {
        speech: Some(&speech),
        output: Some(&output),
        ..deps(&provider)
    };
    let outcome = pipeline
        .send(&mut state, &mut store, "hola", turn_deps, Instant::now())
        .await
        .expect("turn should succeed")
        .expect("send should be accepted");

    assert_eq!(speech.synthesized.load(Ordering::SeqCst), 1);
    assert!(!outcome.interrupted);
    assert!(!output.stopped.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn speaking_over_playback_stops_it() {
    let (_temp_dir, mut store, mut state) = setup();
    let provider = RecordingProvider::new("Una respuesta muy larga");
    let speech = CountingSpeech::default();
    let output = FakeOutput {
        endless: true,
        stopped: Arc::default(),
    };
    let mut pipeline = TurnPipeline::new(Utc::now());

    let turn_deps = TurnDeps {
        speech: Some(&speech),
        output: Some(&output),
        energy: Some(Box::new(LoudMicrophone)),
        ..deps(&provider)
    };
    let outcome = pipeline
        .send(&mut state, &mut store, "hola", turn_deps, Instant::now())
        .await
        .expect("turn should succeed")
        .expect("send should be accepted");

    assert!(outcome.interrupted);
    assert!(output.stopped.load(Ordering::SeqCst));
    assert_eq!(state.feedback.len(), 1, "the turn continues after barge-in");
}

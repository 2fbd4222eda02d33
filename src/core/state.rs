//! Application state and the reducers that mutate it.
//!
//! `AppState` is loaded once from the [`StateStore`] and written back one key
//! at a time through [`AppState::persist`]; nothing else touches the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::config::RuntimeConfig;
use crate::core::languages::{self, LanguageOption};
use crate::core::message::Message;
use crate::core::progress::{ProgressUpdate, MAX_SCORE};
use crate::core::store::{StateKey, StateStore, StoreError};
use crate::providers::ProviderKind;

pub const DEFAULT_LANGUAGE: &str = "spanish";
pub const DEFAULT_THEME: &str = "light";

pub fn default_goals() -> Vec<String> {
    vec![
        "Master basic greetings".to_string(),
        "Learn numbers 1-100".to_string(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Casual,
    Structured,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Casual => "casual",
            Mode::Structured => "structured",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "casual" => Some(Mode::Casual),
            "structured" => Some(Mode::Structured),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Casual => Mode::Structured,
            Mode::Structured => Mode::Casual,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Proficiency {
    pub fn as_str(self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
        }
    }

    /// Any label the model might return; unknown labels are `Beginner`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "intermediate" => Proficiency::Intermediate,
            "advanced" => Proficiency::Advanced,
            _ => Proficiency::Beginner,
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub vocabulary: u32,
    pub grammar: u32,
    /// Minutes
    pub duration: u64,
}

impl ProgressState {
    /// Scores limited to `0..=MAX_SCORE`.
    pub fn clamped(self) -> Self {
        Self {
            vocabulary: self.vocabulary.min(MAX_SCORE),
            grammar: self.grammar.min(MAX_SCORE),
            duration: self.duration,
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            vocabulary: 20,
            grammar: 30,
            duration: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressHistoryPoint {
    /// Unix milliseconds
    pub t: i64,
    pub vocabulary: u32,
    pub grammar: u32,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// RFC 3339 timestamp
    pub date: String,
    pub summary: String,
}

/// Lowercase error category → occurrences.
pub type CommonErrors = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub openai_model: String,
    pub groq_model: String,
    pub anthropic_model: String,
    pub system_prompt: String,
    pub language: String,
    pub mode: Mode,
    pub tts_voice: String,
    pub tts_enabled: bool,
    pub theme: String,
    pub is_dark: bool,
}

impl Settings {
    pub fn model_for(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Groq => &self.groq_model,
            ProviderKind::Anthropic => &self.anthropic_model,
        }
    }

    pub fn current_model(&self) -> &str {
        self.model_for(self.provider)
    }

    pub fn set_model(&mut self, provider: ProviderKind, model: impl Into<String>) {
        let model = model.into().trim().to_string();
        match provider {
            ProviderKind::OpenAi => self.openai_model = model,
            ProviderKind::Groq => self.groq_model = model,
            ProviderKind::Anthropic => self.anthropic_model = model,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub settings: Settings,
    pub messages: Vec<Message>,
    pub feedback: Vec<String>,
    pub goals: Vec<String>,
    pub progress: ProgressState,
    pub progress_history: Vec<ProgressHistoryPoint>,
    pub journal: Vec<JournalEntry>,
    pub proficiency: Proficiency,
    pub common_errors: CommonErrors,
}

impl AppState {
    /// Read every key from `store`, falling back to configured defaults.
    pub fn load(store: &StateStore, runtime: &RuntimeConfig) -> Self {
        let default_provider = runtime
            .default_provider
            .as_deref()
            .and_then(ProviderKind::parse)
            .unwrap_or(ProviderKind::OpenAi);
        let model_default =
            |provider: ProviderKind| runtime.default_model(provider.id()).unwrap_or("").to_string();

        let provider = store
            .get::<Option<String>>(StateKey::ApiProvider, None)
            .as_deref()
            .and_then(ProviderKind::parse)
            .unwrap_or(default_provider);

        let settings = Settings {
            provider,
            openai_model: store.get(StateKey::OpenaiModel, model_default(ProviderKind::OpenAi)),
            groq_model: store.get(StateKey::GroqModel, model_default(ProviderKind::Groq)),
            anthropic_model: store.get(
                StateKey::AnthropicModel,
                model_default(ProviderKind::Anthropic),
            ),
            system_prompt: store.get(StateKey::SystemPrompt, runtime.system_prompt.clone()),
            language: store.get(StateKey::Language, DEFAULT_LANGUAGE.to_string()),
            mode: store.get(StateKey::Mode, Mode::default()),
            tts_voice: store.get(
                StateKey::TtsVoice,
                runtime.default_voice.clone().unwrap_or_default(),
            ),
            tts_enabled: store.get(StateKey::TtsEnabled, true),
            theme: store.get(StateKey::Theme, DEFAULT_THEME.to_string()),
            is_dark: store.get(StateKey::IsDark, false),
        };

        AppState {
            settings,
            messages: store.get(StateKey::Messages, Vec::new()),
            feedback: store.get(StateKey::Feedback, Vec::new()),
            goals: store.get(StateKey::Goals, default_goals()),
            progress: store
                .get(StateKey::Progress, ProgressState::default())
                .clamped(),
            progress_history: store.get(StateKey::ProgressHistory, Vec::new()),
            journal: store.get(StateKey::Journal, Vec::new()),
            proficiency: store.get(StateKey::Proficiency, Proficiency::default()),
            common_errors: store.get(StateKey::CommonErrors, CommonErrors::new()),
        }
    }

    /// Write the value behind `key` to the store.
    pub fn persist(&self, store: &mut StateStore, key: StateKey) -> Result<(), StoreError> {
        let settings = &self.settings;
        match key {
            StateKey::Language => store.set(key, &settings.language),
            StateKey::Mode => store.set(key, &settings.mode),
            StateKey::Messages => store.set(key, &self.messages),
            StateKey::Feedback => store.set(key, &self.feedback),
            StateKey::Goals => store.set(key, &self.goals),
            StateKey::Progress => store.set(key, &self.progress),
            StateKey::ProgressHistory => store.set(key, &self.progress_history),
            StateKey::Journal => store.set(key, &self.journal),
            StateKey::Proficiency => store.set(key, &self.proficiency),
            StateKey::CommonErrors => store.set(key, &self.common_errors),
            StateKey::ApiProvider => store.set(key, settings.provider.id()),
            StateKey::TtsVoice => store.set(key, &settings.tts_voice),
            StateKey::TtsEnabled => store.set(key, &settings.tts_enabled),
            StateKey::OpenaiModel => store.set(key, &settings.openai_model),
            StateKey::GroqModel => store.set(key, &settings.groq_model),
            StateKey::AnthropicModel => store.set(key, &settings.anthropic_model),
            StateKey::SystemPrompt => store.set(key, &settings.system_prompt),
            StateKey::Theme => store.set(key, &settings.theme),
            StateKey::IsDark => store.set(key, &settings.is_dark),
        }
    }

    pub fn persist_all(&self, store: &mut StateStore, keys: &[StateKey]) -> Result<(), StoreError> {
        for key in keys {
            self.persist(store, *key)?;
        }
        Ok(())
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback.push(feedback.into());
    }

    /// Count one occurrence per category; categories are lowercased.
    pub fn merge_errors<'a, I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for category in categories {
            let key = category.trim().to_lowercase();
            let key = if key.is_empty() {
                "general".to_string()
            } else {
                key
            };
            *self.common_errors.entry(key).or_insert(0) += 1;
        }
    }

    /// Common errors, most frequent first; ties alphabetical.
    pub fn sorted_errors(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self
            .common_errors
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    pub fn apply_progress(&mut self, update: &ProgressUpdate) {
        self.progress = update.progress;
        self.progress_history.push(update.history_point);
        if let Some(entry) = &update.journal_entry {
            self.journal.push(entry.clone());
        }
    }

    pub fn add_goal(&mut self, goal: &str) -> bool {
        let goal = goal.trim();
        if goal.is_empty() {
            return false;
        }
        self.goals.push(goal.to_string());
        true
    }

    /// Replace goal `index`; returns the previous text.
    pub fn edit_goal(&mut self, index: usize, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let slot = self.goals.get_mut(index)?;
        Some(std::mem::replace(slot, text.to_string()))
    }

    pub fn delete_goal(&mut self, index: usize) -> Option<String> {
        if index < self.goals.len() {
            Some(self.goals.remove(index))
        } else {
            None
        }
    }

    /// Adopt suggested goals. An empty suggestion keeps the current list.
    pub fn replace_goals(&mut self, goals: Vec<String>) -> bool {
        let goals: Vec<String> = goals
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if goals.is_empty() {
            return false;
        }
        self.goals = goals;
        true
    }

    /// Select `language` if it is one of `available`.
    pub fn set_language(&mut self, language: &str, available: &[LanguageOption]) -> Result<(), String> {
        match languages::find(available, language) {
            Some(option) => {
                self.settings.language = option.value.clone();
                Ok(())
            }
            None => Err(format!(
                "Unknown language '{}'. Available: {}",
                language,
                available
                    .iter()
                    .map(|l| l.value.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }

    /// Make the selected language one of `available`; returns true when it changed.
    pub fn ensure_language(&mut self, available: &[LanguageOption], locale_base: &str) -> bool {
        if available.is_empty() || languages::find(available, &self.settings.language).is_some() {
            return false;
        }
        match languages::match_language(available, locale_base) {
            Some(value) => {
                self.settings.language = value;
                true
            }
            None => false,
        }
    }

    /// Forget the conversation and everything derived from it. Settings stay.
    pub fn reset_learning(&mut self) {
        self.messages.clear();
        self.feedback.clear();
        self.goals = default_goals();
        self.progress = ProgressState::default();
        self.progress_history.clear();
        self.journal.clear();
        self.proficiency = Proficiency::default();
        self.common_errors.clear();
    }
}

/// Keys cleared by [`AppState::reset_learning`].
pub const LEARNING_KEYS: [StateKey; 8] = [
    StateKey::Messages,
    StateKey::Feedback,
    StateKey::Goals,
    StateKey::Progress,
    StateKey::ProgressHistory,
    StateKey::Journal,
    StateKey::Proficiency,
    StateKey::CommonErrors,
];

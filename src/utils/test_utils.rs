//! Fakes and fixtures shared by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::core::analysis::{parse_feedback, FeedbackAnalysis};
use crate::core::config::{Config, RuntimeConfig};
use crate::core::error::TutorError;
use crate::core::message::Message;
use crate::core::session::TutorSession;
use crate::core::store::StateStore;
use crate::core::state::Proficiency;
use crate::providers::{
    CompletionClient, CompletionRequest, ProxyTransport, TutorContext, TutorProvider,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes env-var mutation across tests and restores the previous values on drop.
pub struct TestEnvVarGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl TestEnvVarGuard {
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            saved: Vec::new(),
            _lock: lock,
        }
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(k, _)| k == key) {
            self.saved.push((key.to_string(), std::env::var_os(key)));
        }
    }

    pub fn set_var(&mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) {
        self.remember(key);
        std::env::set_var(key, value);
    }

    pub fn remove_var(&mut self, key: &str) {
        self.remember(key);
        std::env::remove_var(key);
    }
}

impl Drop for TestEnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

pub fn test_runtime() -> RuntimeConfig {
    RuntimeConfig::resolve(&Config::default(), |_| None)
}

/// A session whose state file lives in `dir`, with no provider connected.
pub fn create_test_session(dir: &Path) -> TutorSession {
    let store = StateStore::open(dir.join("state.json")).expect("store should open");
    TutorSession::new(store, test_runtime(), reqwest::Client::new())
}

pub fn create_test_messages() -> Vec<Message> {
    vec![
        Message::user("Hola, me llamo Ana"),
        Message::tutor("¡Hola Ana! ¿De dónde eres?"),
        Message::user("Soy de Madrid"),
    ]
}

/// Scripted [`TutorProvider`] that records which calls were made.
pub struct RecordingProvider {
    pub reply: Result<String, u16>,
    pub feedback: String,
    pub level: Proficiency,
    pub goals: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            feedback: r#"{"comments":["Bien."],"errors":[]}"#.to_string(),
            level: Proficiency::Beginner,
            goals: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply requests fail with this HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_string());
        }
    }
}

#[async_trait]
impl TutorProvider for RecordingProvider {
    fn name(&self) -> String {
        "recording".to_string()
    }

    async fn generate_reply(
        &self,
        _ctx: &TutorContext,
        _history: &[Message],
    ) -> Result<String, TutorError> {
        self.record("generate_reply");
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(TutorError::Request {
                endpoint: "fake://chat".to_string(),
                status: *status,
                body: "API Error: scripted failure".to_string(),
            }),
        }
    }

    async fn analyze_text(
        &self,
        _ctx: &TutorContext,
        _text: &str,
    ) -> Result<FeedbackAnalysis, TutorError> {
        self.record("analyze_text");
        Ok(parse_feedback(&self.feedback))
    }

    async fn detect_level(
        &self,
        _ctx: &TutorContext,
        _history: &[Message],
    ) -> Result<Proficiency, TutorError> {
        self.record("detect_level");
        Ok(self.level)
    }

    async fn suggest_goals(
        &self,
        _ctx: &TutorContext,
        _history: &[Message],
    ) -> Result<Vec<String>, TutorError> {
        self.record("suggest_goals");
        Ok(self.goals.clone())
    }
}

/// [`CompletionClient`] answering from a queue; records every request.
pub struct RecordingClient {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingClient {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for RecordingClient {
    fn provider_id(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, TutorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        next.ok_or_else(|| TutorError::invalid_response("fake://complete", "no scripted reply"))
    }
}

/// [`ProxyTransport`] answering by path; records `(path, body)` pairs.
pub struct RecordingTransport {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub fn new(responses: &[(&str, Value)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(path, value)| (path.to_string(), value.clone()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProxyTransport for RecordingTransport {
    fn base(&self) -> &str {
        "http://proxy.test"
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TutorError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((path.to_string(), body));
        }
        self.responses.get(path).cloned().ok_or(TutorError::Request {
            endpoint: format!("http://proxy.test{path}"),
            status: 404,
            body: "AI request failed: 404".to_string(),
        })
    }
}

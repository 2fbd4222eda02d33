use std::error::Error as StdError;
use std::fmt;

use crate::core::store::StoreError;

const CONFIG_QUICK_FIXES: &[&str] = &[
    "lingo status                      # Show the resolved configuration",
    "lingo set default-provider openai # Pick a provider",
    "lingo set default-model openai gpt-4o  # Configure the model for a provider",
    "export OPENAI_API_KEY=sk-...      # Provide credentials for direct calls",
    "export LINGO_AI_API_BASE=http://localhost:3000  # Or route through a proxy",
];

const AUDIO_QUICK_FIXES: &[&str] = &[
    "export LINGO_AUDIO_API_BASE=http://localhost:3001",
    "export LINGO_STT_MODEL=whisper-1",
    "export LINGO_TTS_MODEL=tts-1 LINGO_TTS_FORMAT=mp3",
];

/// Failures surfaced by network adapters, speech I/O and persistence.
///
/// Malformed model output is deliberately absent: it is recovered where it is
/// parsed and never reaches the user.
#[derive(Debug)]
pub enum TutorError {
    /// Missing base URL, API key, model or format. Never retried.
    Config(String),
    /// Same as `Config`, for the speech endpoints.
    AudioConfig(String),
    /// The endpoint answered with a non-success status.
    Request {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    Network {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response arrived but did not have the expected shape.
    InvalidResponse { endpoint: String, message: String },
    /// Microphone, audio file or player unavailable.
    Device(String),
    Store(StoreError),
}

impl TutorError {
    pub fn config(message: impl Into<String>) -> Self {
        TutorError::Config(message.into())
    }

    pub fn audio_config(message: impl Into<String>) -> Self {
        TutorError::AudioConfig(message.into())
    }

    pub fn device(message: impl Into<String>) -> Self {
        TutorError::Device(message.into())
    }

    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        TutorError::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        TutorError::InvalidResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, TutorError::Config(_) | TutorError::AudioConfig(_))
    }

    pub fn quick_fixes(&self) -> &'static [&'static str] {
        match self {
            TutorError::Config(_) => CONFIG_QUICK_FIXES,
            TutorError::AudioConfig(_) => AUDIO_QUICK_FIXES,
            _ => &[],
        }
    }

    /// Short text for the status line; details go to the log.
    pub fn user_message(&self) -> String {
        match self {
            TutorError::Config(message) | TutorError::AudioConfig(message) => message.clone(),
            TutorError::Device(message) => message.clone(),
            TutorError::Request { status, .. } => format!("Request failed ({status})"),
            TutorError::Network { .. } | TutorError::InvalidResponse { .. } => {
                "Request failed".to_string()
            }
            TutorError::Store(_) => "Could not save local state".to_string(),
        }
    }
}

impl fmt::Display for TutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TutorError::Config(message) => write!(f, "Configuration error: {message}"),
            TutorError::AudioConfig(message) => write!(f, "Audio configuration error: {message}"),
            TutorError::Request {
                endpoint,
                status,
                body,
            } => write!(f, "Request to {endpoint} failed with status {status}: {body}"),
            TutorError::Network { endpoint, source } => {
                write!(f, "Request to {endpoint} failed: {source}")
            }
            TutorError::InvalidResponse { endpoint, message } => {
                write!(f, "Unexpected response from {endpoint}: {message}")
            }
            TutorError::Device(message) => write!(f, "Device error: {message}"),
            TutorError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for TutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TutorError::Network { source, .. } => Some(source),
            TutorError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TutorError {
    fn from(value: StoreError) -> Self {
        TutorError::Store(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_carry_quick_fixes() {
        let err = TutorError::config("Model not configured: groq");
        assert!(err.is_config());
        assert!(!err.quick_fixes().is_empty());
        assert_eq!(err.user_message(), "Model not configured: groq");
        assert_eq!(
            err.to_string(),
            "Configuration error: Model not configured: groq"
        );
    }

    #[test]
    fn request_errors_hide_body_from_user_message() {
        let err = TutorError::Request {
            endpoint: "http://localhost:3000/chat".to_string(),
            status: 502,
            body: "upstream exploded".to_string(),
        };
        assert_eq!(err.user_message(), "Request failed (502)");
        assert!(err.to_string().contains("upstream exploded"));
        assert!(err.quick_fixes().is_empty());
    }
}

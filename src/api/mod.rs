//! Wire types for the chat, proxy and audio endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::message::Message;
use crate::core::state::Mode;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn from_message(message: &Message) -> Self {
        Self::new(message.role.to_api_role(), message.content.clone())
    }
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[derive(Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct AnthropicStreamEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub delta: Option<AnthropicDelta>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Deserialize)]
pub struct AnthropicDelta {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct ProxyChatRequest<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub system: &'a str,
    pub language: &'a str,
    pub mode: Mode,
    pub messages: &'a [Message],
}

#[derive(Serialize)]
pub struct ProxyAnalyzeRequest<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub system: &'a str,
    pub text: &'a str,
}

#[derive(Serialize)]
pub struct ProxyProficiencyRequest<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
}

#[derive(Serialize)]
pub struct ProxyGoalsRequest<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
}

#[derive(Deserialize, Default)]
pub struct ProxyContentResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ProxyLevelResponse {
    #[serde(default)]
    pub level: Option<String>,
}

/// `goals` is left untyped: anything but an array of strings means "no suggestion".
#[derive(Deserialize, Default)]
pub struct ProxyGoalsResponse {
    #[serde(default)]
    pub goals: Value,
}

impl ProxyGoalsResponse {
    pub fn into_goals(self) -> Vec<String> {
        match self.goals {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub input: &'a str,
    pub response_format: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proxy_chat_body_uses_tutor_role_names() {
        let messages = vec![Message::user("Hola"), Message::tutor("¡Hola!")];
        let body = ProxyChatRequest {
            provider: "groq",
            model: "llama",
            system: "",
            language: "spanish",
            mode: Mode::Structured,
            messages: &messages,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "provider": "groq",
                "model": "llama",
                "system": "",
                "language": "spanish",
                "mode": "structured",
                "messages": [
                    {"role": "user", "content": "Hola"},
                    {"role": "tutor", "content": "¡Hola!"}
                ]
            })
        );
    }

    #[test]
    fn chat_messages_use_api_role_names() {
        let message = ChatMessage::from_message(&Message::tutor("Bonjour"));
        assert_eq!(message.role, "assistant");
    }

    #[test]
    fn goals_response_tolerates_non_arrays() {
        let parsed: ProxyGoalsResponse = serde_json::from_str(r#"{"goals":"none"}"#).unwrap();
        assert!(parsed.into_goals().is_empty());
        let parsed: ProxyGoalsResponse =
            serde_json::from_str(r#"{"goals":["Verbs", 3, "Food"]}"#).unwrap();
        assert_eq!(parsed.into_goals(), vec!["Verbs", "Food"]);
    }

    #[test]
    fn anthropic_system_is_omitted_when_empty() {
        let body = AnthropicRequest {
            model: "claude".to_string(),
            system: None,
            messages: vec![ChatMessage::new("user", "hi")],
            max_tokens: 1024,
            stream: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("system").is_none());
    }
}

use futures_util::StreamExt;
use memchr::memchr;
use tracing::{debug, warn};

use crate::api::{AnthropicStreamEvent, ChatResponse};
use crate::core::error::TutorError;

/// Event framing of the two streaming chat APIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamDialect {
    /// `data: {"choices":[{"delta":{"content":..}}]}` terminated by `data: [DONE]`
    OpenAi,
    /// `content_block_delta` events terminated by `message_stop`
    Anthropic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_openai_payload(payload: &str) -> Option<StreamMessage> {
    if payload == "[DONE]" {
        return Some(StreamMessage::End);
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map(StreamMessage::Chunk),
        Err(_) if payload.trim().is_empty() => None,
        Err(_) => Some(StreamMessage::Error(format_api_error(payload))),
    }
}

fn handle_anthropic_payload(payload: &str) -> Option<StreamMessage> {
    match serde_json::from_str::<AnthropicStreamEvent>(payload) {
        Ok(event) => match event.kind.as_str() {
            "content_block_delta" => event
                .delta
                .and_then(|delta| delta.text)
                .map(StreamMessage::Chunk),
            "message_stop" => Some(StreamMessage::End),
            "error" => Some(StreamMessage::Error(format_api_error(payload))),
            // message_start, content_block_start/stop, message_delta, ping
            _ => None,
        },
        Err(_) if payload.trim().is_empty() => None,
        Err(_) => Some(StreamMessage::Error(format_api_error(payload))),
    }
}

/// Interpret one SSE line. `event:` lines and comments yield nothing.
pub fn process_sse_line(line: &str, dialect: StreamDialect) -> Option<StreamMessage> {
    let payload = extract_data_payload(line)?;
    match dialect {
        StreamDialect::OpenAi => handle_openai_payload(payload),
        StreamDialect::Anthropic => handle_anthropic_payload(payload),
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Condense an error body into something worth logging.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API Error: {summary}");
            }
        }
        if let Ok(compact) = serde_json::to_string(&json_value) {
            return format!("API Error: {compact}");
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("API Error: {collapsed}")
}

/// Splits a byte stream into complete lines.
#[derive(Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();

        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(line) => lines.push(line.trim().to_string()),
                Err(e) => warn!(error = %e, "invalid UTF-8 in stream; skipping line"),
            }
            self.buffer.drain(..=newline_pos);
        }

        lines
    }

    /// Whatever trailed the last newline.
    pub fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

/// Accumulates chunks until the stream ends or reports an error.
#[derive(Default)]
pub struct ReplyCollector {
    text: String,
    chunks: usize,
    error: Option<String>,
    ended: bool,
}

impl ReplyCollector {
    /// Returns true once no more lines should be fed.
    pub fn feed_line(&mut self, line: &str, dialect: StreamDialect) -> bool {
        match process_sse_line(line, dialect) {
            Some(StreamMessage::Chunk(chunk)) => {
                self.text.push_str(&chunk);
                self.chunks += 1;
                false
            }
            Some(StreamMessage::Error(message)) => {
                self.error = Some(message);
                true
            }
            Some(StreamMessage::End) => {
                self.ended = true;
                true
            }
            None => false,
        }
    }

    pub fn finish(self, endpoint: &str) -> Result<String, TutorError> {
        if let Some(message) = self.error {
            return Err(TutorError::invalid_response(endpoint, message));
        }
        debug!(
            endpoint,
            chunks = self.chunks,
            ended = self.ended,
            "stream finished"
        );
        Ok(self.text)
    }
}

/// Read an SSE chat response to completion and return the assembled reply.
pub async fn collect_stream(
    response: reqwest::Response,
    dialect: StreamDialect,
    endpoint: &str,
) -> Result<String, TutorError> {
    let mut stream = response.bytes_stream();
    let mut lines = SseLineBuffer::default();
    let mut collector = ReplyCollector::default();

    while let Some(chunk) = stream.next().await {
        let chunk_bytes = chunk.map_err(|e| TutorError::network(endpoint, e))?;
        for line in lines.push(&chunk_bytes) {
            if collector.feed_line(&line, dialect) {
                return collector.finish(endpoint);
            }
        }
    }

    if let Some(line) = lines.finish() {
        collector.feed_line(&line, dialect);
    }
    collector.finish(endpoint)
}

/// Turn a non-success response into `TutorError::Request`.
pub async fn error_for_status(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, TutorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(TutorError::Request {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: format_api_error(&error_text),
    })
}

use async_trait::async_trait;

use crate::api::{ChatMessage, ChatRequest};
use crate::core::chat_stream::{collect_stream, error_for_status, StreamDialect};
use crate::core::error::TutorError;
use crate::providers::{CompletionClient, CompletionRequest, ProviderSession};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// OpenAI-compatible `chat/completions`; serves OpenAI and Groq.
pub struct OpenAiClient {
    http: reqwest::Client,
    session: ProviderSession,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, session: ProviderSession) -> Self {
        Self { http, session }
    }

    pub fn build_request(request: CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.trim().is_empty() {
            messages.push(ChatMessage::new("system", request.system));
        }
        messages.extend(request.messages);
        ChatRequest {
            model: request.model,
            messages,
            stream: true,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn provider_id(&self) -> &str {
        self.session.provider.id()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, TutorError> {
        let chat_url = construct_api_url(&self.session.base_url, "chat/completions");
        let http_request = self
            .http
            .post(&chat_url)
            .header("Content-Type", "application/json");
        let http_request =
            add_auth_headers(http_request, self.provider_id(), &self.session.api_key);

        let response = http_request
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| TutorError::network(&chat_url, e))?;
        let response = error_for_status(response, &chat_url).await?;
        collect_stream(response, StreamDialect::OpenAi, &chat_url).await
    }
}

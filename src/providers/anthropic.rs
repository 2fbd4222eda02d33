use async_trait::async_trait;

use crate::api::AnthropicRequest;
use crate::core::chat_stream::{collect_stream, error_for_status, StreamDialect};
use crate::core::error::TutorError;
use crate::providers::{CompletionClient, CompletionRequest, ProviderSession};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub const MAX_TOKENS: u32 = 1024;

/// Anthropic `messages` endpoint. The system prompt travels outside the message list.
pub struct AnthropicClient {
    http: reqwest::Client,
    session: ProviderSession,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, session: ProviderSession) -> Self {
        Self { http, session }
    }

    pub fn build_request(request: CompletionRequest) -> AnthropicRequest {
        let system = Some(request.system).filter(|s| !s.trim().is_empty());
        AnthropicRequest {
            model: request.model,
            system,
            messages: request.messages,
            max_tokens: MAX_TOKENS,
            stream: true,
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn provider_id(&self) -> &str {
        self.session.provider.id()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, TutorError> {
        let url = construct_api_url(&self.session.base_url, "messages");
        let http_request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json");
        let http_request =
            add_auth_headers(http_request, self.provider_id(), &self.session.api_key);

        let response = http_request
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| TutorError::network(&url, e))?;
        let response = error_for_status(response, &url).await?;
        collect_stream(response, StreamDialect::Anthropic, &url).await
    }
}

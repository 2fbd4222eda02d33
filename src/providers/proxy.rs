//! Self-hosted AI API that forwards to the vendor on the server side.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::{
    ProxyAnalyzeRequest, ProxyChatRequest, ProxyContentResponse, ProxyGoalsRequest,
    ProxyGoalsResponse, ProxyLevelResponse, ProxyProficiencyRequest,
};
use crate::core::analysis::{parse_feedback, FeedbackAnalysis};
use crate::core::error::TutorError;
use crate::core::message::Message;
use crate::core::state::Proficiency;
use crate::providers::prompts;
use crate::providers::{TutorContext, TutorProvider};
use crate::utils::url::{construct_api_url, normalize_base_url};

/// `POST {base}{path}` with a JSON body, returning the decoded JSON reply.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    fn base(&self) -> &str;

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TutorError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    base: String,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client, base: &str) -> Self {
        Self {
            http,
            base: normalize_base_url(base),
        }
    }
}

#[async_trait]
impl ProxyTransport for HttpTransport {
    fn base(&self) -> &str {
        &self.base
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, TutorError> {
        let url = construct_api_url(&self.base, path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TutorError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let mut body = format!("AI request failed: {}", status.as_u16());
            if !text.trim().is_empty() {
                body.push_str("; ");
                body.push_str(text.trim());
            }
            return Err(TutorError::Request {
                endpoint: url,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TutorError::invalid_response(&url, e.to_string()))
    }
}

pub struct ProxyProvider<T> {
    transport: T,
}

impl<T: ProxyTransport> ProxyProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R>(&self, path: &str, body: impl serde::Serialize) -> Result<R, TutorError>
    where
        R: DeserializeOwned + Default,
    {
        let body = serde_json::to_value(body).map_err(|e| {
            TutorError::invalid_response(path, format!("could not encode request: {e}"))
        })?;
        let value = self.transport.post_json(path, body).await?;
        if value.is_null() {
            return Ok(R::default());
        }
        serde_json::from_value(value).map_err(|e| {
            TutorError::invalid_response(construct_api_url(self.transport.base(), path), e.to_string())
        })
    }
}

#[async_trait]
impl<T: ProxyTransport> TutorProvider for ProxyProvider<T> {
    fn name(&self) -> String {
        format!("proxy {}", self.transport.base())
    }

    async fn generate_reply(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<String, TutorError> {
        debug!(
            provider = ctx.provider.id(),
            model = %ctx.model,
            messages = history.len(),
            "requesting tutor reply via proxy"
        );
        let body = ProxyChatRequest {
            provider: ctx.provider.id(),
            model: &ctx.model,
            system: &ctx.system_prompt,
            language: &ctx.language,
            mode: ctx.mode,
            messages: history,
        };
        let response: ProxyContentResponse = self.call("/chat", body).await?;
        Ok(response.content.unwrap_or_default())
    }

    async fn analyze_text(
        &self,
        ctx: &TutorContext,
        text: &str,
    ) -> Result<FeedbackAnalysis, TutorError> {
        let system = prompts::analyze_system(&ctx.language);
        let body = ProxyAnalyzeRequest {
            provider: ctx.provider.id(),
            model: &ctx.model,
            system: &system,
            text,
        };
        let response: ProxyContentResponse = self.call("/analyze", body).await?;
        Ok(parse_feedback(&response.content.unwrap_or_default()))
    }

    async fn detect_level(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Proficiency, TutorError> {
        let prompt = prompts::proficiency_prompt(&ctx.language, history);
        let body = ProxyProficiencyRequest {
            provider: ctx.provider.id(),
            model: &ctx.model,
            system: prompts::PROFICIENCY_SYSTEM,
            prompt: &prompt,
        };
        let response: ProxyLevelResponse = self.call("/proficiency", body).await?;
        Ok(Proficiency::from_label(
            response.level.as_deref().unwrap_or("beginner"),
        ))
    }

    async fn suggest_goals(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Vec<String>, TutorError> {
        let system = prompts::goals_system(&ctx.language);
        let user = prompts::goals_user(history);
        let body = ProxyGoalsRequest {
            provider: ctx.provider.id(),
            model: &ctx.model,
            system: &system,
            user: &user,
        };
        let response: ProxyGoalsResponse = self.call("/goals", body).await?;
        Ok(response.into_goals())
    }
}

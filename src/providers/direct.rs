use async_trait::async_trait;
use tracing::debug;

use crate::api::ChatMessage;
use crate::core::analysis::{parse_feedback, parse_goals, parse_level, FeedbackAnalysis};
use crate::core::error::TutorError;
use crate::core::message::Message;
use crate::core::state::Proficiency;
use crate::providers::prompts;
use crate::providers::{TutorContext, TutorProvider};

/// A single chat completion, vendor-neutral.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

/// Sends one completion and returns the full reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, TutorError>;
}

/// Talks to a vendor chat API and shapes the four tutor calls as completions.
pub struct DirectProvider<C> {
    client: C,
}

impl<C: CompletionClient> DirectProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn single_turn(
        &self,
        ctx: &TutorContext,
        system: String,
        user: String,
    ) -> Result<String, TutorError> {
        self.client
            .complete(CompletionRequest {
                model: ctx.model.clone(),
                system,
                messages: vec![ChatMessage::new("user", user)],
            })
            .await
    }
}

#[async_trait]
impl<C: CompletionClient> TutorProvider for DirectProvider<C> {
    fn name(&self) -> String {
        self.client.provider_id().to_string()
    }

    async fn generate_reply(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<String, TutorError> {
        debug!(
            provider = self.client.provider_id(),
            model = %ctx.model,
            messages = history.len(),
            "requesting tutor reply"
        );
        let request = CompletionRequest {
            model: ctx.model.clone(),
            system: prompts::reply_system_prompt(ctx),
            messages: history.iter().map(ChatMessage::from_message).collect(),
        };
        self.client.complete(request).await
    }

    async fn analyze_text(
        &self,
        ctx: &TutorContext,
        text: &str,
    ) -> Result<FeedbackAnalysis, TutorError> {
        let raw = self
            .single_turn(ctx, prompts::analyze_system(&ctx.language), text.to_string())
            .await?;
        Ok(parse_feedback(&raw))
    }

    async fn detect_level(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Proficiency, TutorError> {
        let raw = self
            .single_turn(
                ctx,
                prompts::PROFICIENCY_SYSTEM.to_string(),
                prompts::proficiency_prompt(&ctx.language, history),
            )
            .await?;
        Ok(parse_level(&raw))
    }

    async fn suggest_goals(
        &self,
        ctx: &TutorContext,
        history: &[Message],
    ) -> Result<Vec<String>, TutorError> {
        let raw = self
            .single_turn(
                ctx,
                prompts::goals_system(&ctx.language),
                prompts::goals_user(history),
            )
            .await?;
        Ok(parse_goals(&raw))
    }
}

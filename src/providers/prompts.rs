use crate::core::config::runtime::DEFAULT_SYSTEM_PROMPT;
use crate::core::message::{user_contents, Message};
use crate::core::state::Mode;
use crate::providers::TutorContext;

pub const PROFICIENCY_SYSTEM: &str = "You are a proficiency detector.";

fn mode_instruction(language: &str, mode: Mode) -> String {
    match mode {
        Mode::Casual => format!(
            "Have a casual conversation in {language}. Keep replies short and natural and ask a follow-up question."
        ),
        Mode::Structured => format!(
            "Run a structured {language} lesson. Correct the user's mistakes, explain each correction briefly, then continue with a short exercise."
        ),
    }
}

/// System prompt for conversational replies on direct providers.
pub fn reply_system_prompt(ctx: &TutorContext) -> String {
    let base = ctx.system_prompt.trim();
    let base = if base.is_empty() {
        DEFAULT_SYSTEM_PROMPT
    } else {
        base
    };
    format!(
        "{base}\nThe user is learning {}.\n{}",
        ctx.language,
        mode_instruction(&ctx.language, ctx.mode)
    )
}

pub fn analyze_system(language: &str) -> String {
    format!(
        r#"Return only valid JSON: {{"comments":["..."],"errors":[{{"type":"...","note":"..."}}]}}. Analyze grammar, vocabulary, and syntax for {language}. No extra text."#
    )
}

pub fn proficiency_prompt(language: &str, history: &[Message]) -> String {
    let joined = user_contents(history).collect::<Vec<_>>().join("; ");
    format!(
        r#"Return only valid JSON: {{"level":"beginner|intermediate|advanced"}}. Determine level from these {language} user messages: {joined}"#
    )
}

pub fn goals_system(language: &str) -> String {
    format!(
        r#"Return only valid JSON: {{"goals":["..."]}}. Suggest 3 concise learning goals tailored to the user's recent messages in {language}."#
    )
}

pub fn goals_user(history: &[Message]) -> String {
    user_contents(history).collect::<Vec<_>>().join("\n")
}

use super::{show, usage_status};
use crate::cli::settings::helpers::{format_bool, parse_bool};
use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::session::TutorSession;
use crate::core::state::Mode;
use crate::core::store::StateKey;
use crate::providers::ProviderKind;
use crate::ui::panels;

const USAGE_MODE: &str = "Usage: /mode [casual|structured]";
const USAGE_TTS: &str = "Usage: /tts [on|off]";

pub(crate) fn handle_settings(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::settings(
        &session.state,
        &session.languages,
        &session.voices,
        session.player().map(|p| p.program()),
    );
    show(session, panel)
}

pub(crate) fn handle_provider(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let current = session.state.settings.provider;
    if invocation.args_len() == 0 {
        let listing = ProviderKind::ALL
            .iter()
            .map(|kind| {
                let marker = if *kind == current { "*" } else { " " };
                format!("{marker} {:<10} {}", kind.id(), kind.display_name())
            })
            .collect::<Vec<_>>()
            .join("\n");
        return show(session, format!("Providers:\n{listing}"));
    }

    match ProviderKind::parse(invocation.args) {
        Some(kind) => {
            session.set_provider(kind);
            let model = session.state.settings.current_model();
            let note = if model.is_empty() {
                " (no model configured; use /model <id>)".to_string()
            } else {
                format!(" using {model}")
            };
            session.notify(format!("Provider set: {}{note}", kind.display_name()));
            CommandResult::Continue
        }
        None => {
            session.notify(format!(
                "Unknown provider: {}. Choose openai, groq or anthropic.",
                invocation.args
            ));
            CommandResult::Continue
        }
    }
}

pub(crate) fn handle_model(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let provider = session.state.settings.provider;
    if invocation.args_len() == 0 {
        let model = session.state.settings.current_model();
        let shown = if model.is_empty() { "(not configured)" } else { model };
        let panel = format!("Model for {}: {shown}", provider.display_name());
        return show(session, panel);
    }
    if invocation.args_len() > 1 {
        return usage_status(session, "Usage: /model <id>");
    }

    let model = invocation.args.to_string();
    session.update(&[provider.model_key()], |state| {
        state.settings.set_model(provider, model.clone())
    });
    session.notify(format!("Model set: {model}"));
    CommandResult::Continue
}

pub(crate) fn handle_language(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args_len() == 0 {
        let current = session.state.settings.language.clone();
        let listing = session
            .languages
            .iter()
            .map(|option| {
                let marker = if option.value == current { "*" } else { " " };
                format!("{marker} {:<12} {}", option.value, option.code())
            })
            .collect::<Vec<_>>()
            .join("\n");
        return show(session, format!("Languages:\n{listing}"));
    }

    let languages = session.languages.clone();
    match session.state.set_language(invocation.args, &languages) {
        Ok(()) => {
            session.persist(&[StateKey::Language]);
            let language = session.state.settings.language.clone();
            session.notify(format!("Now practising {language}"));
        }
        Err(message) => session.notify(message),
    }
    CommandResult::Continue
}

pub(crate) fn handle_mode(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let mode = if invocation.args_len() == 0 {
        session.state.settings.mode.toggled()
    } else {
        match Mode::parse(invocation.args) {
            Some(mode) => mode,
            None => return usage_status(session, USAGE_MODE),
        }
    };
    session.update(&[StateKey::Mode], |state| state.settings.mode = mode);
    session.notify(format!("Mode: {mode}"));
    CommandResult::Continue
}

pub(crate) fn handle_voice(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args_len() == 0 {
        if session.voices.is_empty() {
            return show(session, "No voices available.".to_string());
        }
        let current = session.state.settings.tts_voice.clone();
        let listing = session
            .voices
            .iter()
            .map(|voice| {
                let marker = if *voice == current { "*" } else { " " };
                format!("{marker} {voice}")
            })
            .collect::<Vec<_>>()
            .join("\n");
        return show(session, format!("Voices:\n{listing}"));
    }

    let voice = invocation.args.to_string();
    if !session.voices.is_empty() && !session.voices.iter().any(|v| *v == voice) {
        let message = format!("Unknown voice: {voice}. Available: {}", session.voices.join(", "));
        session.notify(message);
        return CommandResult::Continue;
    }
    session.update(&[StateKey::TtsVoice], |state| {
        state.settings.tts_voice = voice.clone()
    });
    session.notify(format!("Voice set: {voice}"));
    CommandResult::Continue
}

pub(crate) fn handle_tts(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let enabled = if invocation.args_len() == 0 {
        !session.state.settings.tts_enabled
    } else {
        match parse_bool(invocation.args) {
            Some(value) => value,
            None => return usage_status(session, USAGE_TTS),
        }
    };
    session.update(&[StateKey::TtsEnabled], |state| {
        state.settings.tts_enabled = enabled
    });
    let mut message = format!("Speech: {}", format_bool(enabled));
    if enabled && session.player().is_none() {
        message.push_str(" (set LINGO_PLAYER to hear replies)");
    }
    session.notify(message);
    CommandResult::Continue
}

pub(crate) fn handle_prompt(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let panel = format!("System prompt: {}", session.state.settings.system_prompt);
        return show(session, panel);
    }

    let prompt = if invocation.args.eq_ignore_ascii_case("reset") {
        session.runtime.system_prompt.clone()
    } else {
        invocation.args.to_string()
    };
    session.update(&[StateKey::SystemPrompt], |state| {
        state.settings.system_prompt = prompt
    });
    session.notify("System prompt updated.");
    CommandResult::Continue
}

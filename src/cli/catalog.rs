//! Listing and status commands: `voices`, `languages`, `health`, `status`.

use std::error::Error;
use std::fmt::Write as _;

use crate::core::builtin_providers::find_builtin_provider;
use crate::core::config::data::path_display;
use crate::core::config::{AudioBackend, ChatBackend, RuntimeConfig};
use crate::core::languages::{self, LanguageOption};
use crate::core::session::TutorSession;
use crate::core::state::AppState;
use crate::core::store::StateStore;
use crate::providers::ProviderKind;
use crate::ui::panels;

use super::say::print_error;

pub async fn list_voices(session: &TutorSession) -> Result<(), Box<dyn Error>> {
    let voices = match session.speech().voices().await {
        Ok(voices) => voices,
        Err(err) => {
            print_error(&err);
            std::process::exit(1);
        }
    };
    if voices.is_empty() {
        println!("No voices available.");
        return Ok(());
    }

    println!("Available voices:\n");
    for voice in &voices {
        let marker = if *voice == session.state.settings.tts_voice {
            "*"
        } else {
            " "
        };
        println!("  {marker} {voice}");
    }
    println!("\n* = selected voice");
    Ok(())
}

pub async fn list_languages(session: &TutorSession) -> Result<(), Box<dyn Error>> {
    let available = if session.runtime.languages.is_empty() {
        let fetched = session.speech().languages().await.ok();
        languages::resolve(&session.runtime.languages, fetched)
    } else {
        session.languages.clone()
    };
    println!(
        "{}",
        language_table(&available, &session.state.settings.language)
    );
    Ok(())
}

pub fn language_table(available: &[LanguageOption], selected: &str) -> String {
    let mut table = String::from("| Language | Code |\n|---|---|\n");
    for option in available {
        let name = if option.value.eq_ignore_ascii_case(selected) {
            format!("{}*", option.label)
        } else {
            option.label.clone()
        };
        let _ = writeln!(table, "| {name} | {} |", option.code());
    }
    table.push_str("\n\\* = current language");
    table
}

pub async fn print_health(session: &TutorSession) {
    let lines = session.health().await;
    if lines.is_empty() {
        println!("No health endpoints for this audio backend.");
        return;
    }
    for line in lines {
        println!("{} {line}", health_mark(&line));
    }
}

/// ✅ for a reachable or configured endpoint, ❌ for a failure, • otherwise.
pub fn health_mark(line: &str) -> &'static str {
    let status = line.split_once(':').map_or("", |(_, status)| status.trim());
    match status {
        "200" | "configured" => "✅",
        "missing" | "not_configured" | "unreachable" => "❌",
        s if s.parse::<u16>().is_ok() => "❌",
        _ => "•",
    }
}

pub fn print_status(runtime: &RuntimeConfig, store: &StateStore) {
    let state = AppState::load(store, runtime);
    println!("{}", status_report(runtime, &state));
    println!("State file: {}", path_display(store.path()));
}

pub fn status_report(runtime: &RuntimeConfig, state: &AppState) -> String {
    let mut out = String::from("Providers:\n\n");
    out.push_str("| Provider | Model | URL | API key |\n");
    out.push_str("|---|---|---|:---:|\n");
    for kind in ProviderKind::ALL {
        let id = if kind == state.settings.provider {
            format!("{}*", kind.id())
        } else {
            kind.id().to_string()
        };
        let model = state.settings.model_for(kind);
        let model = if model.is_empty() { "(none)" } else { model };
        let url = runtime
            .base_url_override(kind.id())
            .map(str::to_string)
            .or_else(|| find_builtin_provider(kind.id()).map(|p| p.base_url.clone()))
            .unwrap_or_default();
        let key = if runtime.api_key(kind.id()).is_some() {
            "✅"
        } else {
            "❌"
        };
        let _ = writeln!(out, "| {id} | {model} | {url} | {key} |");
    }
    out.push_str("\n\\* = selected provider\n\n");

    let chat = match runtime.chat_backend {
        ChatBackend::Direct => "direct".to_string(),
        ChatBackend::Proxy => format!(
            "proxy ({})",
            runtime.ai_api_base.as_deref().unwrap_or("no base URL")
        ),
    };
    let audio = match runtime.audio_backend {
        AudioBackend::OpenAi => "openai".to_string(),
        AudioBackend::Local => format!(
            "local ({})",
            runtime.audio_api_base.as_deref().unwrap_or("no base URL")
        ),
    };
    let _ = writeln!(out, "Chat backend: {chat}");
    let _ = writeln!(out, "Audio backend: {audio}");
    let _ = writeln!(
        out,
        "Player: {}",
        runtime.player.as_deref().unwrap_or("(none, replies are not spoken)")
    );
    let _ = writeln!(out, "\n{}", panels::status_line(state, usize::MAX));
    let _ = writeln!(
        out,
        "Messages: {} • Journal entries: {}",
        state.messages.len(),
        state.journal.len()
    );
    out.trim_end().to_string()
}

//! Plain-text panels for the conversation, feedback, goals, progress,
//! journal and settings views.

use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

use crate::core::languages::LanguageOption;
use crate::core::message::{Message, Role};
use crate::core::progress::ProgressUpdate;
use crate::core::state::{AppState, JournalEntry, ProgressHistoryPoint, ProgressState};
use crate::core::turn::TurnOutcome;

const SEPARATOR: &str = " • ";
const BAR_WIDTH: usize = 20;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Most recent history points shown in a sparkline.
pub const SPARKLINE_POINTS: usize = 40;
pub const INTERRUPTED_HINT: &str = "(playback interrupted, answer with /record <file>)";

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Tutor => "Tutor",
    }
}

pub fn conversation(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages yet. Say hello!".to_string();
    }
    let mut out = String::new();
    for message in messages {
        let _ = writeln!(out, "{}: {}", speaker(message.role), message.content);
    }
    out.trim_end().to_string()
}

/// Latest feedback plus the running tally of error categories.
pub fn feedback(items: &[String], errors: &[(&str, u32)]) -> String {
    let mut out = String::from("Feedback\n");
    match items.last() {
        Some(latest) => {
            let _ = writeln!(out, "  Latest: {latest}");
            if items.len() > 1 {
                let _ = writeln!(out, "  ({} earlier)", items.len() - 1);
            }
        }
        None => out.push_str("  No feedback yet.\n"),
    }

    out.push_str("\nCommon errors\n");
    if errors.is_empty() {
        out.push_str("  None recorded.\n");
    } else {
        let width = errors.iter().map(|(name, _)| name.width()).max().unwrap_or(0);
        for (name, count) in errors {
            let _ = writeln!(out, "  {}  {count}", pad(name, width));
        }
    }
    out.trim_end().to_string()
}

pub fn goals(goals: &[String]) -> String {
    if goals.is_empty() {
        return "Goals\n  None. Add one with /goal add <text>".to_string();
    }
    let mut out = String::from("Goals\n");
    for (index, goal) in goals.iter().enumerate() {
        let _ = writeln!(out, "  {}. {goal}", index + 1);
    }
    out.trim_end().to_string()
}

pub fn progress(state: &AppState) -> String {
    let ProgressState {
        vocabulary,
        grammar,
        duration,
    } = state.progress;
    let mut out = String::from("Progress\n");
    let _ = writeln!(out, "  Vocabulary  {} {vocabulary:>3}", bar(vocabulary, 100, BAR_WIDTH));
    let _ = writeln!(out, "  Grammar     {} {grammar:>3}", bar(grammar, 100, BAR_WIDTH));
    let _ = writeln!(out, "  Practice    {duration} min");
    let _ = writeln!(out, "  Level       {}", state.proficiency);

    if !state.progress_history.is_empty() {
        let (vocab, grammar) = history_series(&state.progress_history);
        out.push('\n');
        let _ = writeln!(out, "  Vocabulary  {}", sparkline(&vocab, 100));
        let _ = writeln!(out, "  Grammar     {}", sparkline(&grammar, 100));
    }
    out.trim_end().to_string()
}

fn history_series(history: &[ProgressHistoryPoint]) -> (Vec<u32>, Vec<u32>) {
    let start = history.len().saturating_sub(SPARKLINE_POINTS);
    history[start..]
        .iter()
        .map(|point| (point.vocabulary, point.grammar))
        .unzip()
}

pub fn journal(entries: &[JournalEntry]) -> String {
    if entries.is_empty() {
        return "Journal\n  No entries yet.".to_string();
    }
    let mut out = String::from("Journal\n");
    for entry in entries.iter().rev() {
        let date = entry.date.get(..10).unwrap_or(&entry.date);
        let _ = writeln!(out, "  {date}  {}", entry.summary);
    }
    out.trim_end().to_string()
}

pub fn settings(
    state: &AppState,
    languages: &[LanguageOption],
    voices: &[String],
    player: Option<&str>,
) -> String {
    let settings = &state.settings;
    let model = settings.current_model();
    let voice = if settings.tts_voice.is_empty() {
        "(none)"
    } else {
        settings.tts_voice.as_str()
    };
    let rows = [
        ("Provider", settings.provider.display_name().to_string()),
        (
            "Model",
            if model.is_empty() {
                "(not configured)".to_string()
            } else {
                model.to_string()
            },
        ),
        ("Language", settings.language.clone()),
        ("Mode", settings.mode.to_string()),
        ("Voice", voice.to_string()),
        (
            "Speech",
            match (settings.tts_enabled, player) {
                (true, Some(player)) => format!("on ({player})"),
                (true, None) => "on (no player configured)".to_string(),
                (false, _) => "off".to_string(),
            },
        ),
        ("Theme", format!("{}{}", settings.theme, if settings.is_dark { " (dark)" } else { "" })),
        ("System prompt", settings.system_prompt.clone()),
    ];

    let width = rows.iter().map(|(label, _)| label.width()).max().unwrap_or(0);
    let mut out = String::from("Settings\n");
    for (label, value) in rows {
        let _ = writeln!(out, "  {}  {value}", pad(label, width));
    }
    if !languages.is_empty() {
        let names: Vec<&str> = languages.iter().map(|l| l.value.as_str()).collect();
        let _ = writeln!(out, "\n  Languages: {}", names.join(", "));
    }
    if !voices.is_empty() {
        let _ = writeln!(out, "  Voices: {}", voices.join(", "));
    }
    out.trim_end().to_string()
}

/// One-line summary shown above the prompt, fitted to `max_width` columns.
pub fn status_line(state: &AppState, max_width: usize) -> String {
    let settings = &state.settings;
    let fields = [
        settings.provider.id().to_string(),
        settings.current_model().to_string(),
        settings.language.clone(),
        settings.mode.to_string(),
        state.proficiency.to_string(),
    ];
    let line = fields
        .iter()
        .filter(|f| !f.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    truncate(&line, max_width)
}

/// What the user sees after a completed turn.
pub fn turn_summary(outcome: &TurnOutcome) -> String {
    let mut out = format!("Tutor: {}\n", outcome.reply);
    if outcome.interrupted {
        let _ = writeln!(out, "  {INTERRUPTED_HINT}");
    }
    let _ = writeln!(out, "  Feedback: {}", outcome.feedback);
    let ProgressUpdate {
        vocabulary_delta,
        grammar_delta,
        journal_entry,
        ..
    } = &outcome.progress;
    let _ = writeln!(
        out,
        "  Progress: +{vocabulary_delta} vocabulary, +{grammar_delta} grammar • level {}",
        outcome.proficiency
    );
    if let Some(entry) = journal_entry {
        let _ = writeln!(out, "  Journal: {}", entry.summary);
    }
    if outcome.goals_updated {
        out.push_str("  Goals updated (see /goals)\n");
    }
    out.trim_end().to_string()
}

/// Horizontal bar of `width` cells filled in proportion to `value / max`.
pub fn bar(value: u32, max: u32, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value.min(max) as usize * width) + (max as usize / 2)) / max as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// One block glyph per value, scaled against `max`.
pub fn sparkline(values: &[u32], max: u32) -> String {
    let top = SPARK_LEVELS.len() - 1;
    values
        .iter()
        .map(|&value| {
            let level = if max == 0 {
                0
            } else {
                (value.min(max) as usize * top) / max as usize
            };
            SPARK_LEVELS[level]
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

use super::usage_status;
use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::message::{Message, Role};
use crate::core::session::TutorSession;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn default_dump_filename() -> String {
    format!("lingo-conversation-{}.txt", Local::now().format("%Y-%m-%d"))
}

/// Write the conversation as plain text. Refuses to overwrite unless asked.
pub fn dump_conversation(
    messages: &[Message],
    path: &Path,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if messages.is_empty() {
        return Err("No conversation to dump - the chat history is empty.".into());
    }

    if !overwrite && path.exists() {
        return Err(format!(
            "File '{}' already exists. Please specify a different filename with /dump <filename>.",
            path.display()
        )
        .into());
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for msg in messages {
        match msg.role {
            Role::User => writeln!(writer, "You: {}", msg.content)?,
            Role::Tutor => writeln!(writer, "Tutor: {}", msg.content)?,
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub(crate) fn handle_dump(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let filename = match invocation.args_len() {
        0 => default_dump_filename(),
        1 => invocation.args.to_string(),
        _ => return usage_status(session, "Usage: /dump [filename]"),
    };

    match dump_conversation(&session.state.messages, Path::new(&filename), false) {
        Ok(()) => session.notify(format!("Dumped: {filename}")),
        Err(e) => session.notify(format!("Dump error: {e}")),
    }
    CommandResult::Continue
}

pub(crate) fn handle_record(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage_status(session, "Usage: /record <file.wav>");
    }
    let path = PathBuf::from(invocation.args);
    if !path.is_file() {
        session.notify(format!("No such file: {}", path.display()));
        return CommandResult::Continue;
    }
    CommandResult::Transcribe(path)
}

pub(crate) fn handle_health(_session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::CheckHealth
}

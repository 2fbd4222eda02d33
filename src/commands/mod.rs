//! Slash commands typed at the chat prompt.
//!
//! Handlers are synchronous and only touch the session. Anything that needs
//! the network is handed back to the chat loop as a [`CommandResult`].

mod handlers;
mod registry;

pub use handlers::io::{default_dump_filename, dump_conversation};
pub use registry::{all_commands, find_command, Command, CommandInvocation, CommandUsage};

use std::path::PathBuf;

use crate::core::session::TutorSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    /// Transcribe the WAV file and send the text as a message.
    Transcribe(PathBuf),
    CheckHealth,
    Quit,
}

pub fn process_input(session: &mut TutorSession, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    match registry::find_command(command_name) {
        Some(command) => {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            (command.handler)(session, invocation)
        }
        None => {
            session.notify(format!("Unknown command: /{command_name}. Type /help for a list."));
            CommandResult::Continue
        }
    }
}

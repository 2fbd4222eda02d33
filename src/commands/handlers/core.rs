use super::{position_arg, required_arg, show, usage_status};
use crate::commands::registry::{all_commands, CommandInvocation};
use crate::commands::CommandResult;
use crate::core::session::TutorSession;
use crate::core::store::StateKey;
use crate::ui::panels;

const USAGE_GOAL: &str = "Usage: /goal add <text> | /goal edit <n> <text> | /goal delete <n>";

pub(crate) fn handle_help(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Type a message to talk to your tutor.\n\nCommands:\n");
    let width = all_commands()
        .iter()
        .flat_map(|command| command.usages.iter())
        .map(|usage| usage.syntax.len())
        .max()
        .unwrap_or(0);
    for command in all_commands() {
        for usage in command.usages {
            help.push_str(&format!(
                "  {:<width$}  {}\n",
                usage.syntax,
                usage.description,
                width = width
            ));
        }
    }
    show(session, help.trim_end().to_string())
}

pub(crate) fn handle_history(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::conversation(&session.state.messages);
    show(session, panel)
}

pub(crate) fn handle_feedback(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::feedback(&session.state.feedback, &session.state.sorted_errors());
    show(session, panel)
}

pub(crate) fn handle_goals(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::goals(&session.state.goals);
    show(session, panel)
}

pub(crate) fn handle_goal(session: &mut TutorSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(action) = required_arg(session, &invocation, 0, USAGE_GOAL) else {
        return CommandResult::Continue;
    };

    match action.to_ascii_lowercase().as_str() {
        "add" => {
            let text = invocation.rest_from(1);
            if !session.state.add_goal(text) {
                return usage_status(session, "Usage: /goal add <text>");
            }
            session.persist(&[StateKey::Goals]);
            session.notify(format!("Goal added: {text}"));
        }
        "edit" => {
            let Some(index) = invocation.arg(1).and_then(position_arg) else {
                return usage_status(session, "Usage: /goal edit <n> <text>");
            };
            let text = invocation.rest_from(2);
            if text.is_empty() {
                return usage_status(session, "Usage: /goal edit <n> <text>");
            }
            match session.state.edit_goal(index, text) {
                Some(previous) => {
                    session.persist(&[StateKey::Goals]);
                    session.notify(format!("Goal {} changed from: {previous}", index + 1));
                }
                None => session.notify(format!("No goal number {}", index + 1)),
            }
        }
        "delete" | "remove" => {
            let Some(index) = invocation.arg(1).and_then(position_arg) else {
                return usage_status(session, "Usage: /goal delete <n>");
            };
            match session.state.delete_goal(index) {
                Some(removed) => {
                    session.persist(&[StateKey::Goals]);
                    session.notify(format!("Goal removed: {removed}"));
                }
                None => session.notify(format!("No goal number {}", index + 1)),
            }
        }
        _ => return usage_status(session, USAGE_GOAL),
    }
    CommandResult::Continue
}

pub(crate) fn handle_progress(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::progress(&session.state);
    show(session, panel)
}

pub(crate) fn handle_journal(session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let panel = panels::journal(&session.state.journal);
    show(session, panel)
}

pub(crate) fn handle_quit(_session: &mut TutorSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}

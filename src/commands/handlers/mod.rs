pub(super) mod config;
pub(super) mod core;
pub(super) mod io;

use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::session::TutorSession;

pub(super) fn usage_status(session: &mut TutorSession, usage: &'static str) -> CommandResult {
    session.notify(usage);
    CommandResult::Continue
}

pub(super) fn required_arg<'a>(
    session: &mut TutorSession,
    invocation: &CommandInvocation<'a>,
    index: usize,
    usage: &'static str,
) -> Option<&'a str> {
    match invocation.arg(index) {
        Some(value) => Some(value),
        None => {
            session.notify(usage);
            None
        }
    }
}

/// Parse a 1-based position into an index.
pub(super) fn position_arg(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

pub(super) fn show(session: &mut TutorSession, panel: String) -> CommandResult {
    session.notify(panel);
    CommandResult::Continue
}

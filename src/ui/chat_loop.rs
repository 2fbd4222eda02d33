//! Interactive chat loop
//!
//! Reads lines from stdin, dispatches slash commands through
//! [`crate::commands`], and runs everything else as a tutor turn.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::catalog::health_mark;
use crate::cli::say::format_error;
use crate::commands::{process_input, CommandResult};
use crate::core::session::TutorSession;
use crate::ui::panels;

const DEFAULT_WIDTH: usize = 80;

fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|width| *width > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

pub async fn run_chat(mut session: TutorSession) -> Result<(), Box<dyn Error>> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    drive(&mut session, stdin, &mut stdout, terminal_width()).await?;
    Ok(())
}

/// Run the loop until `input` ends or the user quits.
pub async fn drive<R, W>(
    session: &mut TutorSession,
    input: R,
    out: &mut W,
    width: usize,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!(
        provider = session.state.settings.provider.id(),
        language = %session.state.settings.language,
        "chat started"
    );
    writeln!(
        out,
        "Practising {} with your tutor. Type /help for commands, /quit to leave.",
        session.state.settings.language
    )?;
    flush_notices(session, out)?;

    let mut lines = input.lines();
    loop {
        writeln!(out, "{}", panels::status_line(&session.state, width))?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match process_input(session, &line) {
            CommandResult::Continue => {}
            CommandResult::ProcessAsMessage(text) => send_message(session, &text, out).await?,
            CommandResult::Transcribe(path) => match session.transcribe_file(&path).await {
                Ok(text) if text.is_empty() => {
                    writeln!(out, "No speech recognized in {}", path.display())?;
                }
                Ok(text) => {
                    writeln!(out, "You (transcribed): {text}")?;
                    send_message(session, &text, out).await?;
                }
                Err(err) => writeln!(out, "{}", format_error(&err))?,
            },
            CommandResult::CheckHealth => {
                for line in session.health().await {
                    writeln!(out, "{} {line}", health_mark(&line))?;
                }
            }
            CommandResult::Quit => {
                flush_notices(session, out)?;
                break;
            }
        }
        flush_notices(session, out)?;
    }

    debug!(messages = session.state.messages.len(), "chat ended");
    writeln!(out, "Goodbye!")?;
    Ok(())
}

async fn send_message<W: Write>(
    session: &mut TutorSession,
    text: &str,
    out: &mut W,
) -> io::Result<()> {
    match session.send(text).await {
        Ok(Some(outcome)) => writeln!(out, "{}", panels::turn_summary(&outcome)),
        Ok(None) => Ok(()),
        Err(err) => writeln!(
            out,
            "Message send failed: {}\n{}",
            err.source.user_message(),
            format_error(&err.source)
        ),
    }
}

fn flush_notices<W: Write>(session: &mut TutorSession, out: &mut W) -> io::Result<()> {
    for notice in session.take_notices() {
        writeln!(out, "{notice}")?;
    }
    Ok(())
}

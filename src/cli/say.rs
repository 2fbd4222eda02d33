//! REPL-less `say` and `transcribe` commands

use std::error::Error;
use std::path::Path;

use crate::core::error::TutorError;
use crate::core::session::TutorSession;
use crate::ui::panels;

/// `err` followed by its quick fixes, if any.
pub fn format_error(err: &TutorError) -> String {
    let mut out = format!("❌ {err}");
    let fixes = err.quick_fixes();
    if !fixes.is_empty() {
        out.push_str("\n\n💡 Quick fixes:");
        for fix in fixes {
            out.push_str(&format!("\n  • {fix}"));
        }
    }
    out
}

pub fn print_error(err: &TutorError) {
    eprintln!("{}", format_error(err));
}

pub async fn run_say(session: &mut TutorSession, text: Vec<String>) -> Result<(), Box<dyn Error>> {
    let text = text.join(" ");
    if text.trim().is_empty() {
        eprintln!("Usage: lingo say <message>");
        std::process::exit(2);
    }
    send_and_print(session, &text).await
}

pub async fn run_transcribe(
    session: &mut TutorSession,
    file: &Path,
    send: bool,
) -> Result<(), Box<dyn Error>> {
    let transcript = match session.transcribe_file(file).await {
        Ok(text) => text,
        Err(err) => {
            print_error(&err);
            std::process::exit(1);
        }
    };

    if transcript.is_empty() {
        eprintln!("⚠️  No speech recognized in {}", file.display());
        return Ok(());
    }
    println!("You: {transcript}");

    if send {
        send_and_print(session, &transcript).await?;
    }
    Ok(())
}

async fn send_and_print(session: &mut TutorSession, text: &str) -> Result<(), Box<dyn Error>> {
    match session.send(text).await {
        Ok(Some(outcome)) => {
            println!("{}", panels::turn_summary(&outcome));
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            eprintln!("Message send failed ({})", err.step);
            print_error(&err.source);
            std::process::exit(1);
        }
    }
}

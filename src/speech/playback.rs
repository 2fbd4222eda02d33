//! Audio playback through an external player process.

use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tempfile::{Builder, TempPath};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::core::error::TutorError;
use crate::speech::SynthesizedAudio;

#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn start(&self, audio: &SynthesizedAudio) -> Result<Box<dyn PlaybackHandle>, TutorError>;
}

#[async_trait]
pub trait PlaybackHandle: Send {
    /// Resolves when playback ends on its own.
    async fn wait(&mut self) -> Result<(), TutorError>;

    async fn stop(&mut self);
}

/// Runs `<program> [args..] <audio file>` for each clip, e.g. `mpv --really-quiet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPlayer {
    program: String,
    args: Vec<String>,
}

impl ExternalPlayer {
    /// `None` for a blank command line.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

struct PlayerProcess {
    child: Child,
    // Removed from disk when playback is dropped.
    _clip: TempPath,
}

#[async_trait]
impl AudioOutput for ExternalPlayer {
    async fn start(&self, audio: &SynthesizedAudio) -> Result<Box<dyn PlaybackHandle>, TutorError> {
        let suffix = format!(".{}", audio.format.trim_start_matches('.'));
        let mut file = Builder::new()
            .prefix("lingo-tts-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| TutorError::device(format!("Cannot buffer audio for playback: {e}")))?;
        file.write_all(&audio.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| TutorError::device(format!("Cannot buffer audio for playback: {e}")))?;
        let clip = file.into_temp_path();

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&*clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TutorError::device(format!(
                    "Audio player '{}' not found; set LINGO_PLAYER",
                    self.program
                )),
                _ => TutorError::device(format!("Cannot start audio player '{}': {e}", self.program)),
            })?;
        debug!(player = %self.program, bytes = audio.bytes.len(), "playback started");

        Ok(Box::new(PlayerProcess { child, _clip: clip }))
    }
}

#[async_trait]
impl PlaybackHandle for PlayerProcess {
    async fn wait(&mut self) -> Result<(), TutorError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| TutorError::device(format!("Audio player failed: {e}")))?;
        if !status.success() {
            warn!(%status, "audio player exited with an error");
        }
        Ok(())
    }

    async fn stop(&mut self) {
        if let Err(err) = self.child.kill().await {
            debug!(error = %err, "audio player already exited");
        }
    }
}

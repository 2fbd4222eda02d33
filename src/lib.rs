//! Lingo is a terminal language tutor: every message gets a reply in the
//! language being practised, feedback on the learner's writing, and updates
//! to progress, goals and an estimated proficiency level.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the learner state, its persistence, the turn pipeline and
//!   the heuristics that turn replies into progress.
//! - [`providers`] adapts OpenAI, Groq, Anthropic and a self-hosted proxy to a
//!   single tutor capability.
//! - [`speech`] transcribes recordings, synthesizes replies, plays them and
//!   watches for the learner speaking over playback.
//! - [`commands`] implements the slash commands of the chat prompt.
//! - [`ui`] renders text panels and runs the interactive loop.
//! - [`api`] defines the wire payloads shared by provider code.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod providers;
pub mod speech;
pub mod ui;
pub mod utils;

//! Terminal presentation for interactive sessions.
//!
//! - [`panels`]: plain-text views of the conversation, feedback, goals,
//!   progress, journal and settings.
//! - [`chat_loop`]: the line-based loop that dispatches input to
//!   [`crate::commands`] and runs turns through [`crate::core::session`].

pub mod chat_loop;
pub mod panels;

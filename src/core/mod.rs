pub mod analysis;
pub mod builtin_providers;
pub mod chat_stream;
pub mod config;
pub mod error;
pub mod languages;
pub mod message;
pub mod progress;
pub mod session;
pub mod state;
pub mod store;
pub mod turn;

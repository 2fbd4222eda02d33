pub mod data;
pub mod io;
pub mod runtime;

pub use data::Config;
pub use runtime::{AudioBackend, ChatBackend, RuntimeConfig};

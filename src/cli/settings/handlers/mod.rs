//! Setting handlers for different configuration patterns.

pub mod provider_keyed;
pub mod simple;
pub mod string;

pub use provider_keyed::*;
pub use simple::*;
pub use string::*;

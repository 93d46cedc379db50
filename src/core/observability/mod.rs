pub mod macros;
pub mod provider;

pub use provider::{LogGuards, init};

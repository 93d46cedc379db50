pub mod callout;
pub mod client;

pub use callout::{CalloutOutcome, run};
pub use client::{HttpTransport, Transport};

pub mod config;
pub mod registry;

pub use config::{AdapterConfig, ExchangeConfig, LoggingConfig};
pub use registry::AdapterRegistry;

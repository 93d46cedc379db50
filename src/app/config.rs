use crate::core::adapters::{Adapter, AdapterKind};
use config::{Config, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};
use url::Url;

/// How a partner's user sync pixel is deployed
#[derive(Debug, Clone, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Redirect,
    Iframe,
}

/// Partner user sync settings. Carried for the sync endpoints
/// which live outside this crate
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct SyncConfig {
    pub url: String,
    pub kind: SyncKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct AdapterConfig {
    /// Unique name, used in logs and as the registry key
    pub name: String,
    pub kind: AdapterKind,
    /// Partner bid endpoint, absolute http(s) url
    pub endpoint: String,
    #[serde(default = "default_true")]
    #[builder(default = "true")]
    pub enabled: bool,
    /// Include partner response bodies in status failures
    #[serde(default)]
    #[builder(default)]
    pub debug: bool,
    #[serde(default)]
    #[builder(default)]
    pub usersync: Option<SyncConfig>,
}

impl AdapterConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Adapter name must not be empty");
        }

        let url = Url::parse(&self.endpoint).map_err(|e| {
            anyhow::anyhow!(
                "Invalid endpoint '{}' for adapter {}: {}",
                self.endpoint,
                self.name,
                e
            )
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "Endpoint for adapter {} must be http or https, got {}",
                self.name,
                url.scheme()
            );
        }

        Ok(())
    }

    pub fn to_adapter(&self) -> Adapter {
        Adapter::new(self.name.clone(), self.kind, self.endpoint.clone()).with_debug(self.debug)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Builder)]
pub struct ExchangeConfig {
    #[serde(default)]
    #[builder(default)]
    pub adapters: Vec<AdapterConfig>,
    #[serde(default)]
    #[builder(default)]
    pub logging: LoggingConfig,
    /// Upper bound for a single partner exchange, e.g. "300ms"
    #[serde(default = "default_timeout", with = "humantime_serde")]
    #[builder(default = "default_timeout()")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSink {
    #[serde(flatten)]
    pub dest: LogType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogType {
    Stdout {
        #[serde(default = "default_true")]
        color: bool,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        spans: bool,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        rotation: FileRotation,
        #[serde(default)]
        spans: bool,
    },
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> Duration {
    Duration::from_millis(300)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub sinks: Vec<LogSink>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            sinks: vec![LogSink {
                dest: LogType::Stdout {
                    color: true,
                    json: false,
                    spans: false,
                },
            }],
        }
    }
}

impl LoggingConfig {
    /// Validates the logging configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sinks.is_empty() {
            anyhow::bail!("At least one logging sink must be configured");
        }

        self.level.parse::<tracing::Level>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )
        })?;

        Ok(())
    }
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.logging.validate()?;

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than zero");
        }

        let mut names = HashSet::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            adapter.validate()?;

            if !names.insert(adapter.name.as_str()) {
                anyhow::bail!("Duplicate adapter name: {}", adapter.name);
            }
        }

        Ok(())
    }

    pub fn load(path: &PathBuf) -> Result<ExchangeConfig, anyhow::Error> {
        let cfg = Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?;

        let exchange: ExchangeConfig = cfg.try_deserialize()?;
        exchange.validate()?;

        Ok(exchange)
    }

    pub fn from_yaml(yaml: &str) -> Result<ExchangeConfig, anyhow::Error> {
        let cfg = Config::builder()
            .add_source(config::File::from_str(yaml, FileFormat::Yaml))
            .build()?;

        let exchange: ExchangeConfig = cfg.try_deserialize()?;
        exchange.validate()?;

        Ok(exchange)
    }
}

use crate::app::config::{FileRotation, LogType, LoggingConfig};
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

type DynLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync + 'static>;

/// Keeps the non blocking writers flushing. Dropping this
/// flushes and stops all configured sinks
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn writer_layer(writer: NonBlocking, json: bool, spans: bool, ansi: bool) -> DynLayer {
    let span_events = if spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(span_events)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_writer(writer)
            .with_span_events(span_events)
            .boxed()
    }
}

fn build_layers(config: &LoggingConfig) -> Result<(Vec<DynLayer>, Vec<WorkerGuard>)> {
    let mut layers: Vec<DynLayer> = Vec::with_capacity(config.sinks.len());
    let mut guards = Vec::with_capacity(config.sinks.len());

    for sink in &config.sinks {
        match &sink.dest {
            LogType::Stdout { color, json, spans } => {
                let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
                layers.push(writer_layer(writer, *json, *spans, *color));
                guards.push(guard);
            }
            LogType::File {
                path,
                json,
                rotation,
                spans,
            } => {
                let (writer, guard) = create_file_writer(path, rotation)?;
                layers.push(writer_layer(writer, *json, *spans, false));
                guards.push(guard);
            }
        }
    }

    Ok((layers, guards))
}

/// Installs the global subscriber for the configured sinks. Fails
/// if the config is invalid or a subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<LogGuards> {
    config.validate()?;

    let crate_name = env!("CARGO_PKG_NAME").replace('-', "_");
    let filter = EnvFilter::from_default_env()
        .add_directive("error".parse()?)
        .add_directive(format!("{}={}", crate_name, config.level).parse()?);

    let (layers, guards) = build_layers(config)?;

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(LogGuards { _guards: guards })
}

fn create_file_writer(path: &Path, rotation: &FileRotation) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name in path: {}", path.display()))?;

    let directory = path
        .parent()
        .ok_or_else(|| anyhow!("Invalid directory in path: {}", path.display()))?;

    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    }

    let file_appender = match rotation {
        FileRotation::Daily => tracing_appender::rolling::daily(directory, file_name),
        FileRotation::Hourly => tracing_appender::rolling::hourly(directory, file_name),
        FileRotation::Never => tracing_appender::rolling::never(directory, file_name),
    };

    Ok(tracing_appender::non_blocking(file_appender))
}

//! Structured logging setup
//!
//! Everything in the crate logs through `tracing` macros. This module only
//! installs a subscriber for binaries and tests that want output: an
//! `EnvFilter`, then a JSON (production) or pretty (development) `fmt`
//! layer, optionally written through a non-blocking `tracing-appender`
//! writer.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `RESTGATE_LOG_LEVEL` | `info` | base level (`trace`..`error`) |
//! | `RESTGATE_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `RESTGATE_LOG_ASYNC` | `false` | buffer output on a writer thread |
//! | `RESTGATE_LOG_OUTPUT` | `stderr` | `stderr` or `stdout` |
//! | `RESTGATE_LOG_TARGET_FILTER` | unset | extra directives, e.g. `restgate::router=debug` |
//!
//! `RUST_LOG`, when set, takes precedence over `RESTGATE_LOG_LEVEL`.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` means JSON
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Stream the fmt layer writes to
///
/// Defaults to stderr so log lines never mix with command output on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
}

impl LogOutput {
    /// `stdout` selects stdout; anything else means stderr
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "stdout" => LogOutput::Stdout,
            _ => LogOutput::Stderr,
        }
    }

    fn writer(self, non_blocking: bool) -> (BoxMakeWriter, Option<WorkerGuard>) {
        match (self, non_blocking) {
            (LogOutput::Stderr, false) => (BoxMakeWriter::new(std::io::stderr), None),
            (LogOutput::Stdout, false) => (BoxMakeWriter::new(std::io::stdout), None),
            (LogOutput::Stderr, true) => {
                let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
                (BoxMakeWriter::new(writer), Some(guard))
            }
            (LogOutput::Stdout, true) => {
                let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
                (BoxMakeWriter::new(writer), Some(guard))
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
    /// Write through a non-blocking buffered writer
    pub async_logging: bool,
    /// Destination stream
    pub output: LogOutput,
    /// Module filter (comma-separated directives)
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::default_prod()
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RESTGATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("RESTGATE_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env::var("RESTGATE_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            output: env::var("RESTGATE_LOG_OUTPUT")
                .map(|s| LogOutput::parse(&s))
                .unwrap_or_default(),
            target_filter: env::var("RESTGATE_LOG_TARGET_FILTER")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Verbose, human-readable output
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            output: LogOutput::Stderr,
            target_filter: None,
        }
    }

    /// JSON at info level
    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: false,
            output: LogOutput::Stderr,
            target_filter: None,
        }
    }

    /// The configured level, falling back to INFO for unknown names
    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Build the filter: `RUST_LOG` if set, else the level, plus target directives
    ///
    /// Invalid target directives are skipped with a message on stderr since
    /// no subscriber exists yet to report them.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',') {
                let directive = directive.trim();
                if directive.is_empty() {
                    continue;
                }
                match directive.parse() {
                    Ok(d) => filter = filter.add_directive(d),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Initialize logging from [`LogConfig::from_env`]
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    init_logging_with_config(&LogConfig::from_env())
}

/// Install the global subscriber described by `config`
///
/// With `async_logging` the returned guard owns the writer thread; keep it
/// alive for the life of the program or buffered lines are lost on exit.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let (writer, guard) = config.output.writer(config.async_logging);

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

//! Logging setup
//!
//! Every mdbatch binary installs its tracing subscriber through
//! [`init_logging`]. Events go to stderr, so stdout stays free for command
//! output such as prepared JSON lines. A daily rotating file sink can be
//! added from the environment.
//!
//! Library code logs with the structured `tracing` macros and never prints:
//!
//! ```rust
//! use tracing::{debug, warn};
//!
//! let row_id = "c2p2";
//! debug!(row = %row_id, "normalized row");
//! warn!(row = %row_id, field = "field_geo", "malformed coordinates");
//! ```
//!
//! Environment overrides, applied by [`LogConfig::merge_env`]:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `MDBATCH_LOG_LEVEL` | `off`, `error`, `warn`, `info`, `debug`, `trace` |
//! | `MDBATCH_LOG_FORMAT` | `text` or `json` |
//! | `MDBATCH_LOG_DIR` | also write daily files into this directory |
//! | `MDBATCH_LOG_CONSOLE` | `false` silences stderr |
//! | `MDBATCH_LOG_FILTER` | extra directives, e.g. `rusqlite=warn,mdbatch_core=trace` |
//!
//! # Example
//!
//! ```no_run
//! use mdbatch_common::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::for_cli(false);
//! let config = config.clone().merge_env().unwrap_or(config);
//! let _guard = init_logging(&config).ok();
//! tracing::info!("batch run started");
//! ```

use crate::error::{CommonError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// File name prefix of rotated log files
pub const DEFAULT_LOG_FILE_PREFIX: &str = "mdbatch";

/// Event encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(CommonError::Logging(format!("unknown log format '{other}'"))),
        }
    }
}

/// Daily rotating log files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    pub dir: PathBuf,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Most verbose level let through
    pub level: LevelFilter,
    pub format: LogFormat,
    /// Write events to stderr
    pub console: bool,
    pub file: Option<FileSink>,
    /// Per-target directives added on top of `level`
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            format: LogFormat::Text,
            console: true,
            file: None,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Warnings only, or debug events with `--verbose`
    pub fn for_cli(verbose: bool) -> Self {
        let level = if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };
        Self::default().with_level(level)
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_file(mut self, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.file = Some(FileSink {
            dir: dir.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Apply `MDBATCH_LOG_*` variables on top of this configuration
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(level) = var("MDBATCH_LOG_LEVEL") {
            self.level = level
                .parse()
                .map_err(|_| CommonError::Logging(format!("unknown log level '{level}'")))?;
        }
        if let Some(format) = var("MDBATCH_LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = var("MDBATCH_LOG_DIR") {
            self = self.with_file(dir, DEFAULT_LOG_FILE_PREFIX);
        }
        if let Some(console) = var("MDBATCH_LOG_CONSOLE") {
            self.console = !matches!(console.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Some(filter) = var("MDBATCH_LOG_FILTER") {
            self.directives.extend(
                filter
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from),
            );
        }
        Ok(self)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::new(self.level.to_string());
        for directive in &self.directives {
            let parsed = directive.parse::<Directive>().map_err(|e| {
                CommonError::Logging(format!("bad filter directive '{directive}': {e}"))
            })?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Keeps the file writer thread alive; hold it until the program ends
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, format: LogFormat, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global tracing subscriber
///
/// Fails if the filter directives do not parse, the log directory cannot be
/// created, or a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console {
        layers.push(fmt_layer(std::io::stderr, config.format, true));
    }

    let mut guard = None;
    if let Some(sink) = &config.file {
        std::fs::create_dir_all(&sink.dir)?;
        let appender = tracing_appender::rolling::daily(&sink.dir, &sink.prefix);
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);
        layers.push(fmt_layer(writer, config.format, false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| CommonError::Logging(e.to_string()))?;

    Ok(LoggingGuard { _file: guard })
}

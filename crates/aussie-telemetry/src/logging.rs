//! Subscriber construction from a [`LogConfig`].

use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// How often the file target starts a new file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileRotation {
    /// One file per day.
    #[default]
    Daily,
    /// One file per hour.
    Hourly,
    /// A single ever-growing file.
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Self::DAILY,
            FileRotation::Hourly => Self::HOURLY,
            FileRotation::Never => Self::NEVER,
        }
    }
}

/// Line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, for reading at a terminal.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
    /// The `fmt` default layout.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::InvalidConfig(format!(
                "unknown format `{other}`"
            ))),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error. The default, since `aussie serve` owns stdout.
    #[default]
    Stderr,
    /// Rolling files in this directory.
    File(PathBuf),
}

/// Everything [`setup_logging`] needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base `EnvFilter` expression, usually just a level.
    pub level: String,
    /// Line layout.
    pub format: LogFormat,
    /// Destination.
    pub target: LogTarget,
    /// File name prefix for [`LogTarget::File`].
    pub file_prefix: String,
    /// Rotation for [`LogTarget::File`].
    pub rotation: FileRotation,
    /// Prefix lines with a timestamp.
    pub timestamps: bool,
    /// Include source file and line.
    pub source_location: bool,
    /// Colour output.
    pub ansi: bool,
    /// Extra per-target directives such as `aussie_scheduler=debug`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Compact lines on stderr at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Compact,
            target: LogTarget::Stderr,
            file_prefix: "aussie".to_owned(),
            rotation: FileRotation::Daily,
            timestamps: true,
            source_location: false,
            ansi: true,
            directives: Vec::new(),
        }
    }

    /// Use `format`.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Write to `target`.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Write daily files under `directory`, without colour codes.
    #[must_use]
    pub fn with_file_logging(self, directory: impl Into<PathBuf>) -> Self {
        Self {
            target: LogTarget::File(directory.into()),
            rotation: FileRotation::Daily,
            ansi: false,
            ..self
        }
    }

    /// Append a directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Omit timestamps, e.g. when a supervisor adds its own.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |e: &dyn std::fmt::Display| TelemetryError::InvalidConfig(e.to_string());
        self.directives
            .iter()
            .try_fold(EnvFilter::try_new(&self.level).map_err(|e| invalid(&e))?, |filter, d| {
                Ok(filter.add_directive(d.parse().map_err(|e| invalid(&e))?))
            })
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on an unparsable level or directive, an uncreatable log
/// directory, or when a subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => fmt_layer(config, std::io::stdout),
        LogTarget::Stderr => fmt_layer(config, std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDirectory {
                path: dir.clone(),
                source,
            })?;
            let appender =
                RollingFileAppender::new(config.rotation.into(), dir, &config.file_prefix);
            fmt_layer(config, appender)
        },
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

/// Box a formatted layer, dropping the timer when timestamps are off.
macro_rules! boxed {
    ($layer:expr, $timestamps:expr) => {
        if $timestamps {
            $layer.boxed()
        } else {
            $layer.without_time().boxed()
        }
    };
}

fn fmt_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.ansi)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    match config.format {
        LogFormat::Pretty => boxed!(layer.pretty(), config.timestamps),
        LogFormat::Compact => boxed!(layer.compact(), config.timestamps),
        LogFormat::Json => boxed!(layer.json(), config.timestamps),
        LogFormat::Full => boxed!(layer, config.timestamps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_stdout_free() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.target, LogTarget::Stderr);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.timestamps && config.ansi);
    }

    #[test]
    fn test_file_logging_turns_off_colour() {
        let config = LogConfig::new("warn").with_file_logging("/var/log/aussie");
        assert_eq!(config.target, LogTarget::File("/var/log/aussie".into()));
        assert_eq!(config.rotation, FileRotation::Daily);
        assert!(!config.ansi);
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        let err = "logfmt".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("logfmt"));
    }

    #[test]
    fn test_filter_accepts_target_directives() {
        let config = LogConfig::new("info")
            .with_directive("aussie_vfs=trace")
            .with_directive("aussie_scheduler=debug");
        assert!(config.filter().is_ok());
    }

    #[test]
    fn test_filter_rejects_bad_directive() {
        let config = LogConfig::new("info").with_directive("aussie_vfs=[");
        assert!(matches!(
            config.filter(),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_file_target_creates_directory_once() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("a").join("logs");
        let config = LogConfig::new("info")
            .with_file_logging(&logs)
            .without_timestamps();

        // The only test in this binary that installs a global subscriber.
        setup_logging(&config).unwrap();
        assert!(logs.is_dir());
        assert!(matches!(
            setup_logging(&config),
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }
}

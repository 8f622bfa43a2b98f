//! Configuration errors.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not match the schema.
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// File path, or a `<...>` label for in-memory layers.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for {field}: {message}")]
    ValidationError {
        /// Dotted field path, e.g. `scheduler.tick_secs`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The resolved config could not be rendered.
    #[error("failed to render config: {0}")]
    RenderError(String),

    /// No home directory could be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

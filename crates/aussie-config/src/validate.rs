//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_user(config)?;
    validate_storage(config)?;
    validate_windows(config)?;
    validate_scheduler(config)?;
    validate_kernel(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ConfigResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("unsupported value '{value}'; expected one of: {}", allowed.join(", ")),
        ))
    }
}

fn validate_user(config: &Config) -> ConfigResult<()> {
    let name = &config.user.name;
    if name.trim().is_empty() {
        return Err(invalid("user.name", "must not be empty"));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(invalid("user.name", format!("'{name}' is not a valid directory name")));
    }
    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    let s = &config.storage;
    one_of("storage.backend", &s.backend, &["file", "memory"])?;
    if s.namespace.is_empty() {
        return Err(invalid("storage.namespace", "must not be empty"));
    }
    if s.key.is_empty() {
        return Err(invalid("storage.key", "must not be empty"));
    }
    Ok(())
}

fn validate_windows(config: &Config) -> ConfigResult<()> {
    let w = &config.windows;
    let positive = [
        ("windows.viewport_width", w.viewport_width),
        ("windows.viewport_height", w.viewport_height),
        ("windows.default_width", w.default_width),
        ("windows.default_height", w.default_height),
        ("windows.min_width", w.min_width),
        ("windows.min_height", w.min_height),
    ];
    for (field, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(field, "must be a finite positive number"));
        }
    }

    let non_negative = [
        ("windows.margin", w.margin),
        ("windows.taskbar_height", w.taskbar_height),
        ("windows.cascade_step", w.cascade_step),
    ];
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(field, "must be a finite non-negative number"));
        }
    }
    Ok(())
}

fn validate_scheduler(config: &Config) -> ConfigResult<()> {
    let s = &config.scheduler;
    if s.tick_secs == 0 {
        return Err(invalid("scheduler.tick_secs", "must be at least 1"));
    }
    if s.exec_timeout_secs == 0 {
        return Err(invalid("scheduler.exec_timeout_secs", "must be at least 1"));
    }
    if s.preview_len == 0 {
        return Err(invalid("scheduler.preview_len", "must be at least 1"));
    }
    if !s.tasks_path.starts_with('/') {
        return Err(invalid(
            "scheduler.tasks_path",
            format!("'{}' must be an absolute path", s.tasks_path),
        ));
    }
    Ok(())
}

fn validate_kernel(config: &Config) -> ConfigResult<()> {
    let k = &config.kernel;
    one_of("kernel.fs", &k.fs, &["none", "read", "readwrite"])?;
    one_of("kernel.shell", &k.shell, &["allow", "deny"])?;
    one_of("kernel.network", &k.network, &["allow", "deny"])?;
    if k.bridge_origin.trim().is_empty() {
        return Err(invalid("kernel.bridge_origin", "must not be empty"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    one_of("logging.level", &l.level, &["trace", "debug", "info", "warn", "error"])?;
    one_of("logging.format", &l.format, &["pretty", "compact", "json", "full"])?;
    one_of("logging.target", &l.target, &["stdout", "stderr", "file"])?;
    Ok(())
}

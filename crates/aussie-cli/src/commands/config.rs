//! `aussie config` - inspect the layered configuration.

use std::path::Path;

use anyhow::{Result, bail};
use aussie_config::{ConfigResult, ResolvedConfig, ShowFormat, loader};

use crate::config_bridge;

/// Render the effective configuration.
///
/// # Errors
///
/// Fails if loading failed or rendering fails.
pub(crate) fn show_config(loaded: ConfigResult<ResolvedConfig>, format: ShowFormat) -> Result<String> {
    Ok(loaded?.render(format)?)
}

/// Report whether the configuration loads and validates.
///
/// # Errors
///
/// Returns the load or validation error.
pub(crate) fn validate_config(loaded: ConfigResult<ResolvedConfig>) -> Result<String> {
    match loaded {
        Ok(resolved) if resolved.loaded_files.is_empty() => {
            Ok("Configuration is valid (defaults only)".to_owned())
        },
        Ok(resolved) => Ok(format!(
            "Configuration is valid ({})",
            resolved.loaded_files.join(", ")
        )),
        Err(e) => bail!("Configuration is invalid: {e}"),
    }
}

/// List the paths the loader and runtime look at.
///
/// # Errors
///
/// Fails if no home directory can be found.
pub(crate) fn show_paths(
    explicit: Option<&Path>,
    loaded: Option<&ResolvedConfig>,
) -> Result<String> {
    let home = loader::aussie_home_dir()?;
    let mut lines = vec![describe("user config", &home.join("config.toml"))];
    if let Some(path) = explicit {
        lines.push(describe("explicit config", path));
    }
    match loaded {
        Some(resolved) => {
            if resolved.config.storage.backend == "file" {
                lines.push(describe("data dir", &config_bridge::data_dir(&resolved.config)?));
            }
            if resolved.config.logging.target == "file" {
                let dir = match &resolved.config.logging.directory {
                    Some(dir) => dir.into(),
                    None => loader::default_log_dir()?,
                };
                lines.push(describe("log dir", &dir));
            }
        },
        None => lines.push(describe("data dir", &loader::default_data_dir()?)),
    }
    Ok(lines.join("\n"))
}

fn describe(label: &str, path: &Path) -> String {
    let state = if path.exists() { "exists" } else { "missing" };
    format!("{label:<16} {} ({state})", path.display())
}

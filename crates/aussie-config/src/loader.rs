//! Where config comes from, and in what order.
//!
//! The embedded `defaults.toml` is the bottom layer. `~/.aussie/config.toml`
//! goes over it when present, then the file named by `--config`, then the
//! `AUSSIE_*` variables. Tables merge key by key; anything else is
//! replaced wholesale. The merged tree is deserialized once and validated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use toml::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Files larger than this are refused before parsing.
const MAX_FILE_BYTES: usize = 1 << 20;

/// `(variable, section, key)`.
const ENV_OVERRIDES: [(&str, &str, &str); 3] = [
    ("AUSSIE_USER", "user", "name"),
    ("AUSSIE_LOG", "logging", "level"),
    ("AUSSIE_DATA_DIR", "storage", "data_dir"),
];

/// Accumulates layers and remembers which files contributed.
struct Layers {
    tree: Value,
    sources: Vec<String>,
}

impl Layers {
    fn from_defaults() -> ConfigResult<Self> {
        Ok(Self {
            tree: parse("<embedded defaults>", DEFAULTS_TOML)?,
            sources: Vec::new(),
        })
    }

    fn push_file(&mut self, path: &Path, layer: Value) {
        merge_into(&mut self.tree, layer);
        self.sources.push(path.display().to_string());
    }

    fn push_env(&mut self, env: &HashMap<String, String>) {
        let Value::Table(root) = &mut self.tree else {
            return;
        };
        for (var, section, key) in ENV_OVERRIDES {
            let Some(value) = env.get(var).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let section_table = root
                .entry(section)
                .or_insert_with(|| Value::Table(toml::map::Map::new()));
            if let Value::Table(table) = section_table {
                table.insert(key.to_owned(), Value::String(value.clone()));
                debug!(var, section, key, "environment override");
            }
        }
    }

    fn finish(self) -> ConfigResult<ResolvedConfig> {
        let config: Config = self.tree.try_into().map_err(|source| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source,
        })?;
        validate::validate(&config)?;
        Ok(ResolvedConfig {
            config,
            loaded_files: self.sources,
        })
    }
}

/// Resolve the effective configuration.
///
/// `aussie_home` stands in for `~/.aussie` when set. Only the variables
/// in `env` are consulted for overrides, so tests can pass their own map.
///
/// # Errors
///
/// An unreadable or malformed file, a missing `explicit` file, or a merged
/// result that fails [`validate::validate`].
pub fn load(
    explicit: Option<&Path>,
    aussie_home: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut layers = Layers::from_defaults()?;

    let home = match aussie_home {
        Some(home) => home.to_path_buf(),
        None => aussie_home_dir()?,
    };
    let user_file = home.join("config.toml");
    if let Some(layer) = read_layer(&user_file)? {
        info!(path = %user_file.display(), "user config");
        layers.push_file(&user_file, layer);
    }

    if let Some(path) = explicit {
        let Some(layer) = read_layer(path)? else {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        };
        info!(path = %path.display(), "explicit config");
        layers.push_file(path, layer);
    }

    layers.push_env(env);
    layers.finish()
}

/// The override variables that are set in this process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for (var, _, _) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(var) {
            vars.insert(var.to_owned(), value);
        }
    }
    vars
}

/// `~/.aussie`.
///
/// # Errors
///
/// [`ConfigError::NoHomeDir`] when the platform reports no home directory.
pub fn aussie_home_dir() -> ConfigResult<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
    Ok(dirs.home_dir().join(".aussie"))
}

/// `~/.aussie/data`, used by the file backend when `storage.data_dir` is unset.
///
/// # Errors
///
/// See [`aussie_home_dir`].
pub fn default_data_dir() -> ConfigResult<PathBuf> {
    Ok(aussie_home_dir()?.join("data"))
}

/// `~/.aussie/logs`, used by the file log target when no directory is set.
///
/// # Errors
///
/// See [`aussie_home_dir`].
pub fn default_log_dir() -> ConfigResult<PathBuf> {
    Ok(aussie_home_dir()?.join("logs"))
}

fn parse(label: &str, text: &str) -> ConfigResult<Value> {
    toml::from_str(text).map_err(|source| ConfigError::ParseError {
        path: label.to_owned(),
        source,
    })
}

/// `Ok(None)` when `path` does not exist.
fn read_layer(path: &Path) -> ConfigResult<Option<Value>> {
    let read_error = |source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Ok(None);
        },
        Err(e) => return Err(read_error(e)),
    };
    if text.len() > MAX_FILE_BYTES {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!("file is {} bytes; the limit is {MAX_FILE_BYTES}", text.len()),
        });
    }
    parse(&path.display().to_string(), &text).map(Some)
}

fn merge_into(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Table(base), Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base.insert(key, value);
                    },
                }
            }
        },
        (slot, value) => *slot = value,
    }
}

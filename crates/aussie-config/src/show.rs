//! Resolved configuration display.

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// A loaded configuration and the files that contributed to it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Files merged over the defaults, in load order.
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, as it would appear in a config file.
    #[default]
    Toml,
    /// Pretty-printed JSON.
    Json,
}

impl ResolvedConfig {
    /// Render the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RenderError`] if serialization fails.
    pub fn render(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => {
                let mut out = String::new();
                for file in &self.loaded_files {
                    out.push_str(&format!("# loaded: {file}\n"));
                }
                let body = toml::to_string_pretty(&self.config)
                    .map_err(|e| ConfigError::RenderError(e.to_string()))?;
                out.push_str(&body);
                Ok(out)
            },
            ShowFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::RenderError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_toml_round_trips() {
        let resolved = ResolvedConfig {
            config: Config::default(),
            loaded_files: vec!["/home/a/.aussie/config.toml".to_owned()],
        };
        let text = resolved.render(ShowFormat::Toml).unwrap();
        assert!(text.starts_with("# loaded: /home/a/.aussie/config.toml\n"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_render_json() {
        let resolved = ResolvedConfig {
            config: Config::default(),
            loaded_files: Vec::new(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&resolved.render(ShowFormat::Json).unwrap()).unwrap();
        assert_eq!(json["config"]["kernel"]["fs"], "readwrite");
    }
}

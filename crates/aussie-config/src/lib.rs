//! Layered TOML configuration for the Aussie web OS core.
//!
//! ```rust,no_run
//! let resolved = aussie_config::Config::load(None)?;
//! println!("booting as {}", resolved.config.user.name);
//! # Ok::<(), aussie_config::ConfigError>(())
//! ```
//!
//! Later layers win: embedded defaults, then `~/.aussie/config.toml`, then
//! the `--config` file, then `AUSSIE_USER`, `AUSSIE_LOG` and
//! `AUSSIE_DATA_DIR`. Settings that name a domain enum (policy modes, the
//! storage backend, the log format) stay strings here; [`validate`] checks
//! them and the binary converts them.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod loader;
/// `aussie config show`.
pub mod show;
/// The typed configuration tree.
pub mod types;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Resolve every layer, reading overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`loader::load`].
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None, &loader::collect_env_vars())
    }
}

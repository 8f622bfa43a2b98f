//! Bridge from `aussie_config::Config` to domain types.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use aussie_config::{Config, loader};
use aussie_kernel::{Access, CapabilityPolicy, FsAccess};
use aussie_scheduler::SchedulerConfig;
use aussie_telemetry::{LogConfig, LogFormat};
use aussie_vfs::FileStoreOptions;
use aussie_windows::WindowLayout;

/// Convert config to [`LogConfig`].
///
/// # Errors
///
/// Fails if the `file` target has no directory and no home directory can
/// be found.
pub(crate) fn to_log_config(cfg: &Config) -> Result<LogConfig> {
    let format = cfg.logging.format.parse().unwrap_or(LogFormat::Compact);
    let mut log_config = LogConfig::new(&cfg.logging.level).with_format(format);

    log_config = match cfg.logging.target.as_str() {
        "stdout" => log_config.with_target(aussie_telemetry::LogTarget::Stdout),
        "file" => {
            let dir = match &cfg.logging.directory {
                Some(dir) => PathBuf::from(dir),
                None => loader::default_log_dir()?,
            };
            log_config.with_file_logging(dir)
        },
        _ => log_config,
    };

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }
    Ok(log_config)
}

/// Convert config to [`WindowLayout`].
pub(crate) fn to_window_layout(cfg: &Config) -> WindowLayout {
    let w = &cfg.windows;
    WindowLayout {
        viewport_width: w.viewport_width,
        viewport_height: w.viewport_height,
        margin: w.margin,
        taskbar_height: w.taskbar_height,
        cascade_step: w.cascade_step,
        default_width: w.default_width,
        default_height: w.default_height,
        min_width: w.min_width,
        min_height: w.min_height,
    }
}

/// Convert config to [`SchedulerConfig`].
pub(crate) fn to_scheduler_config(cfg: &Config) -> SchedulerConfig {
    let s = &cfg.scheduler;
    SchedulerConfig {
        tasks_path: s.tasks_path.clone(),
        tick_interval: Duration::from_secs(s.tick_secs),
        preview_len: s.preview_len,
        exec_timeout: Duration::from_secs(s.exec_timeout_secs),
    }
}

/// Convert config to the initial [`CapabilityPolicy`].
///
/// # Errors
///
/// Fails on a policy string that names no known setting.
pub(crate) fn to_policy(cfg: &Config) -> Result<CapabilityPolicy> {
    let k = &cfg.kernel;
    Ok(CapabilityPolicy {
        fs: k.fs.parse::<FsAccess>().context("kernel.fs")?,
        shell: k.shell.parse::<Access>().context("kernel.shell")?,
        network: k.network.parse::<Access>().context("kernel.network")?,
        notifications: k.notifications,
        sandboxed: k.sandboxed,
    })
}

/// Convert config to [`FileStoreOptions`].
pub(crate) fn to_file_store_options(cfg: &Config) -> FileStoreOptions {
    FileStoreOptions {
        user: cfg.user.name.clone(),
        namespace: cfg.storage.namespace.clone(),
        key: cfg.storage.key.clone(),
    }
}

/// Directory for the file backend.
///
/// # Errors
///
/// Fails if no directory is configured and no home directory can be found.
pub(crate) fn data_dir(cfg: &Config) -> Result<PathBuf> {
    match &cfg.storage.data_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(loader::default_data_dir()?),
    }
}

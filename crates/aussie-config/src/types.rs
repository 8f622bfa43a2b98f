//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Who the bootstrap tree is created for.
    pub user: UserSection,
    /// Snapshot persistence backend.
    pub storage: StorageSection,
    /// Viewport and window sizing.
    pub windows: WindowsSection,
    /// Task scheduler cadence and limits.
    pub scheduler: SchedulerSection,
    /// Initial capability policy and bridge settings.
    pub kernel: KernelSection,
    /// Logging level, format, and output target.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// UserSection
// ---------------------------------------------------------------------------

/// The single local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
    /// Name used for `/home/<name>`.
    pub name: String,
}

impl Default for UserSection {
    fn default() -> Self {
        Self {
            name: "guest".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Where the file tree snapshot lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// `"file"` or `"memory"`.
    pub backend: String,
    /// Directory for the file backend. Defaults to `~/.aussie/data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Key-value namespace for the snapshot.
    pub namespace: String,
    /// Key of the snapshot blob.
    pub key: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "file".to_owned(),
            data_dir: None,
            namespace: "vfs".to_owned(),
            key: "tree".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// WindowsSection
// ---------------------------------------------------------------------------

/// Viewport and window geometry, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsSection {
    /// Viewport width.
    pub viewport_width: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Gap between windows and the viewport edges.
    pub margin: f64,
    /// Height reserved for the taskbar.
    pub taskbar_height: f64,
    /// Offset between successively opened windows.
    pub cascade_step: f64,
    /// Width of a new window.
    pub default_width: f64,
    /// Height of a new window.
    pub default_height: f64,
    /// Minimum width after a resize.
    pub min_width: f64,
    /// Minimum height after a resize.
    pub min_height: f64,
}

impl Default for WindowsSection {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            margin: 8.0,
            taskbar_height: 48.0,
            cascade_step: 32.0,
            default_width: 720.0,
            default_height: 480.0,
            min_width: 320.0,
            min_height: 240.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulerSection
// ---------------------------------------------------------------------------

/// Task scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Whether `serve` starts the tick loop.
    pub enabled: bool,
    /// Seconds between ticks.
    pub tick_secs: u64,
    /// Absolute path of the task list inside the file tree.
    pub tasks_path: String,
    /// Characters of output kept per run.
    pub preview_len: usize,
    /// Upper bound on one executor call, in seconds.
    pub exec_timeout_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: 30,
            tasks_path: "/system/scheduler/tasks.json".to_owned(),
            preview_len: 500,
            exec_timeout_secs: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// KernelSection
// ---------------------------------------------------------------------------

/// Initial capability policy and bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSection {
    /// `"none"`, `"read"`, or `"readwrite"`.
    pub fs: String,
    /// `"allow"` or `"deny"`.
    pub shell: String,
    /// `"allow"` or `"deny"`.
    pub network: String,
    /// Deliver notifications.
    pub notifications: bool,
    /// Refuse policy changes arriving over the bridge.
    pub sandboxed: bool,
    /// The only origin the bridge answers.
    pub bridge_origin: String,
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            fs: "readwrite".to_owned(),
            shell: "allow".to_owned(),
            network: "allow".to_owned(),
            notifications: true,
            sandboxed: false,
            bridge_origin: "http://localhost".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// `"stdout"`, `"stderr"`, or `"file"`.
    pub target: String,
    /// Log directory for the `"file"` target. Defaults to `~/.aussie/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Per-crate tracing directives (e.g. `["aussie_vfs=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            target: "stderr".to_owned(),
            directory: None,
            directives: Vec::new(),
        }
    }
}

//! The guarded view over core services that one policy allows.

use std::sync::Arc;

use aussie_events::{EventBus, topics};
use aussie_scheduler::{CommandExecutor, ExecOutput, Invocation, NewTask, ScheduledTask, Scheduler};
use aussie_vfs::{DirEntry, FileStore, FsStat};
use aussie_windows::{OsWindow, WindowRegistry};
use serde_json::Value;
use tracing::debug;

use crate::error::{KernelError, KernelResult};
use crate::policy::CapabilityPolicy;

/// The services a kernel guards.
///
/// Built once by the composition root. Holding these directly bypasses
/// every permission check.
pub struct KernelServices {
    /// File store.
    pub fs: FileStore,
    /// Window registry.
    pub windows: WindowRegistry,
    /// Task scheduler.
    pub scheduler: Scheduler,
    /// Runs `shell.exec` commands.
    pub executor: Arc<dyn CommandExecutor>,
    /// Shared event bus.
    pub bus: EventBus,
}

impl std::fmt::Debug for KernelServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelServices")
            .field("fs", &self.fs)
            .field("windows", &self.windows)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

/// Guarded operations under one fixed policy.
///
/// A façade never changes its policy. After a permission change the
/// kernel builds a new one; see [`crate::Kernel::facade`].
#[derive(Debug, Clone)]
pub struct KernelFacade {
    policy: CapabilityPolicy,
    services: Arc<KernelServices>,
}

impl KernelFacade {
    pub(crate) fn new(policy: CapabilityPolicy, services: Arc<KernelServices>) -> Self {
        Self { policy, services }
    }

    /// The policy this façade enforces.
    #[must_use]
    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    // ---- file store ----

    /// Whether `path` exists.
    ///
    /// # Errors
    ///
    /// [`KernelError::PermissionDenied`] without fs read access.
    pub fn exists(&self, path: &str) -> KernelResult<bool> {
        self.require_fs_read("fs.exists")?;
        Ok(self.services.fs.exists(path))
    }

    /// Read a file.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn read_file(&self, path: &str) -> KernelResult<String> {
        self.require_fs_read("fs.read")?;
        Ok(self.services.fs.read_file(path)?)
    }

    /// List a directory.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn read_dir(&self, path: &str) -> KernelResult<Vec<DirEntry>> {
        self.require_fs_read("fs.list")?;
        Ok(self.services.fs.read_dir(path)?)
    }

    /// Metadata for a path.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn stat(&self, path: &str) -> KernelResult<FsStat> {
        self.require_fs_read("fs.stat")?;
        Ok(self.services.fs.stat(path)?)
    }

    /// Write or append to a file.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn write_file(&self, path: &str, content: &str, append: bool) -> KernelResult<()> {
        self.require_fs_write("fs.write")?;
        Ok(self.services.fs.write_file(path, content, append)?)
    }

    /// Create a directory chain.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn mkdir(&self, path: &str) -> KernelResult<()> {
        self.require_fs_write("fs.mkdir")?;
        Ok(self.services.fs.mkdir(path)?)
    }

    /// Delete a node and its subtree.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn delete(&self, path: &str) -> KernelResult<()> {
        self.require_fs_write("fs.delete")?;
        Ok(self.services.fs.delete(path)?)
    }

    /// Move a node.
    ///
    /// # Errors
    ///
    /// Permission or file store errors.
    pub fn move_path(&self, from: &str, to: &str) -> KernelResult<()> {
        self.require_fs_write("fs.move")?;
        Ok(self.services.fs.move_path(from, to)?)
    }

    // ---- windows ----
    //
    // Window management is not gated by any policy field.

    /// Open (or focus) the window for an app.
    #[must_use]
    pub fn open_window(&self, app_id: &str, title: &str, props: Option<Value>) -> OsWindow {
        self.services.windows.open_window(app_id, title, props)
    }

    /// Close a window.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] if the id is unknown.
    pub fn close_window(&self, id: &str) -> KernelResult<()> {
        Ok(self.services.windows.close_window(id)?)
    }

    /// Bring a window to the front.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] if the id is unknown.
    pub fn focus_window(&self, id: &str) -> KernelResult<()> {
        Ok(self.services.windows.focus_window(id)?)
    }

    /// Move a window.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] for an unknown id or bad geometry.
    pub fn move_window(&self, id: &str, x: f64, y: f64) -> KernelResult<()> {
        Ok(self.services.windows.move_window(id, x, y)?)
    }

    /// Resize a window.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] for an unknown id or bad geometry.
    pub fn resize_window(&self, id: &str, width: f64, height: f64) -> KernelResult<()> {
        Ok(self.services.windows.resize_window(id, width, height)?)
    }

    /// Set a window's minimised flag.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] if the id is unknown.
    pub fn minimize_window(&self, id: &str, minimized: bool) -> KernelResult<()> {
        Ok(self.services.windows.minimize_window(id, minimized)?)
    }

    /// Toggle a window's maximised state.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] if the id is unknown.
    pub fn maximize_window(&self, id: &str) -> KernelResult<()> {
        Ok(self.services.windows.maximize_window(id)?)
    }

    /// Toggle minimised state, refocusing when restored.
    ///
    /// # Errors
    ///
    /// [`KernelError::Window`] if the id is unknown.
    pub fn toggle_minimize(&self, id: &str) -> KernelResult<()> {
        Ok(self.services.windows.toggle_minimize(id)?)
    }

    /// Minimise every window.
    pub fn minimize_all(&self) {
        self.services.windows.minimize_all();
    }

    /// All windows ordered by stacking.
    #[must_use]
    pub fn list_windows(&self) -> Vec<OsWindow> {
        self.services.windows.list_windows()
    }

    // ---- scheduler ----

    /// Add a task. Shares the fs write gate since tasks live in the store.
    ///
    /// # Errors
    ///
    /// Permission or scheduler errors.
    pub fn add_task(&self, task: NewTask) -> KernelResult<ScheduledTask> {
        self.require_fs_write("tasks.add")?;
        Ok(self.services.scheduler.add_task(task)?)
    }

    /// Remove a task.
    ///
    /// # Errors
    ///
    /// Permission or scheduler errors.
    pub fn remove_task(&self, id: &str) -> KernelResult<()> {
        self.require_fs_write("tasks.remove")?;
        Ok(self.services.scheduler.remove_task(id)?)
    }

    /// Run a task immediately.
    ///
    /// # Errors
    ///
    /// Permission or scheduler errors.
    pub async fn run_task(&self, id: &str) -> KernelResult<ScheduledTask> {
        self.require_fs_write("tasks.run")?;
        Ok(self.services.scheduler.run_now(id).await?)
    }

    /// All tasks.
    ///
    /// # Errors
    ///
    /// [`KernelError::PermissionDenied`] without fs read access.
    pub fn list_tasks(&self) -> KernelResult<Vec<ScheduledTask>> {
        self.require_fs_read("tasks.list")?;
        Ok(self.services.scheduler.list_tasks())
    }

    // ---- shell, network, notifications ----

    /// Run a shell command through the executor, bounded by the
    /// scheduler's executor timeout.
    ///
    /// A non-zero exit status is returned as output, not as an error.
    ///
    /// # Errors
    ///
    /// [`KernelError::PermissionDenied`] unless shell is allowed,
    /// [`KernelError::Timeout`] past the deadline, or [`KernelError::Exec`].
    pub async fn exec_shell(&self, command: &str) -> KernelResult<ExecOutput> {
        if !self.policy.shell.is_allowed() {
            return Err(KernelError::denied("shell.exec", "shell=allow"));
        }

        let deadline = self.services.scheduler.config().exec_timeout;
        let invocation = Invocation::Command {
            command: command.to_string(),
        };
        debug!(command, "Executing shell command");
        match tokio::time::timeout(deadline, self.services.executor.execute(&invocation)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(KernelError::Timeout {
                operation: "shell.exec",
                after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Whether collaborators may perform network fetches.
    #[must_use]
    pub fn network_allowed(&self) -> bool {
        self.policy.network.is_allowed()
    }

    /// Fail unless network access is allowed.
    ///
    /// # Errors
    ///
    /// [`KernelError::PermissionDenied`] when network is denied.
    pub fn check_network(&self, operation: &'static str) -> KernelResult<()> {
        if self.network_allowed() {
            Ok(())
        } else {
            Err(KernelError::denied(operation, "network=allow"))
        }
    }

    /// Emit a user-facing notification. Returns `false` when notifications
    /// are disabled; the notification is dropped, not an error.
    pub fn notify(&self, title: &str, message: &str) -> bool {
        if !self.policy.notifications {
            debug!(title, "Notification dropped by policy");
            return false;
        }
        self.services.bus.emit_or_log(
            topics::NOTIFICATION,
            serde_json::json!({ "title": title, "message": message }),
        );
        true
    }

    fn require_fs_read(&self, operation: &'static str) -> KernelResult<()> {
        if self.policy.fs.can_read() {
            Ok(())
        } else {
            Err(KernelError::denied(operation, "fs=read"))
        }
    }

    fn require_fs_write(&self, operation: &'static str) -> KernelResult<()> {
        if self.policy.fs.can_write() {
            Ok(())
        } else {
            Err(KernelError::denied(operation, "fs=readwrite"))
        }
    }
}

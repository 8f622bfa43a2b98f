//! Well-known event names emitted by the core.

/// A file or directory changed. Payload: `{ "path": "/..." }`.
pub const FILE_CHANGE: &str = "file-change";

/// The capability policy changed. Payload: the new policy.
pub const KERNEL_PERMISSIONS_CHANGED: &str = "kernel-permissions-changed";

/// A user-facing notification. Payload: `{ "title", "message" }`.
pub const NOTIFICATION: &str = "notification";

/// A window was created. Payload: `{ "id", "appId" }`.
pub const WINDOW_OPENED: &str = "window-opened";

/// A window was closed. Payload: `{ "id", "appId" }`.
pub const WINDOW_CLOSED: &str = "window-closed";

/// A scheduled task ran. Payload: `{ "id", "name", "ok" }`.
pub const TASK_EXECUTED: &str = "task-executed";

//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_scheduler::prelude::*;` to import all essential types.

// Scheduler
pub use crate::{Scheduler, SchedulerConfig, SchedulerError, SchedulerHandle, SchedulerResult};

// Tasks
pub use crate::{NewTask, Schedule, ScheduledTask, TaskStatus, TaskType};

// Execution
pub use crate::{CommandExecutor, ExecError, ExecOutput, Invocation};

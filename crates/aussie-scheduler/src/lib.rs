//! Aussie Scheduler - recurring task scheduler for the Aussie web OS core.
//!
//! Tasks are persisted as one JSON array inside the virtual file store.
//! A driving tick runs every task whose `nextRun` has passed, hands it to
//! an injected [`CommandExecutor`], and records a bounded preview of the
//! output as `lastResult`.
//!
//! Per task:
//!
//! ```text
//! active --(tick, schedule = once)--------------------> completed
//! active --(tick, schedule = interval|hourly|daily)---> active, nextRun = now + period
//! ```
//!
//! Executor failures never escape a tick; they are recorded on the task and
//! surfaced as a `notification` event.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod executor;
mod scheduler;
mod task;

pub use error::{SchedulerError, SchedulerResult};
pub use executor::{CommandExecutor, ExecError, ExecOutput, Invocation};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
pub use task::{NewTask, Schedule, ScheduledTask, TaskStatus, TaskType};

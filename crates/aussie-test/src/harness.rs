//! Test harness utilities.

use std::sync::Arc;

use aussie_events::EventBus;
use aussie_scheduler::{Scheduler, SchedulerConfig};
use aussie_vfs::FileStore;
use aussie_windows::WindowRegistry;
use tempfile::TempDir;

use crate::fixtures::{test_file_store, test_window_registry};
use crate::mocks::{EventRecorder, RecordingExecutor};

/// Create a temporary directory for a test.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Route `tracing` output to the test writer. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Every core component wired to one bus, over in-memory storage.
#[derive(Debug)]
pub struct TestCore {
    /// Shared event bus.
    pub bus: EventBus,
    /// Records everything emitted on `bus`.
    pub events: EventRecorder,
    /// File store.
    pub fs: FileStore,
    /// Window registry.
    pub windows: WindowRegistry,
    /// Scheduler using `executor`.
    pub scheduler: Scheduler,
    /// The executor behind `scheduler`.
    pub executor: RecordingExecutor,
}

impl TestCore {
    /// Build with the default recording executor.
    pub async fn new() -> Self {
        Self::with_executor(RecordingExecutor::new()).await
    }

    /// Build around a pre-scripted executor.
    ///
    /// # Panics
    ///
    /// Panics if the scheduler cannot be created over the fresh store.
    pub async fn with_executor(executor: RecordingExecutor) -> Self {
        let bus = EventBus::new();
        let events = EventRecorder::attach(&bus);
        let fs = test_file_store(&bus).await;
        let windows = test_window_registry(&bus);
        let scheduler = Scheduler::new(
            fs.clone(),
            bus.clone(),
            Arc::new(executor.clone()),
            SchedulerConfig::default(),
        )
        .expect("scheduler over a fresh store");
        Self {
            bus,
            events,
            fs,
            windows,
            scheduler,
            executor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test_task;

    #[test]
    fn test_dir_is_created() {
        let dir = test_dir();
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_core_components_share_bus() {
        let core = TestCore::new().await;
        core.fs.write_file("/a.txt", "hi", false).unwrap();
        core.windows.open_window("terminal", "Terminal", None);
        core.scheduler.add_task(test_task("t")).unwrap();

        let types = core.events.types();
        assert!(types.iter().any(|t| t == aussie_events::topics::FILE_CHANGE));
        assert!(types.iter().any(|t| t == aussie_events::topics::WINDOW_OPENED));
        assert!(types.iter().any(|t| t == aussie_events::topics::NOTIFICATION));
    }

    #[tokio::test]
    async fn test_core_runs_due_tasks_through_executor() {
        let core = TestCore::new().await;
        core.scheduler.add_task(test_task("ping")).unwrap();
        assert_eq!(core.scheduler.tick().await, 1);
        assert_eq!(core.executor.call_count(), 1);
    }
}

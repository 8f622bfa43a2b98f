//! Shared wiring for integration tests.

use std::path::Path;
use std::sync::Arc;

use aussie_events::EventBus;
use aussie_kernel::{CapabilityPolicy, Kernel, KernelServices};
use aussie_scheduler::{Scheduler, SchedulerConfig};
use aussie_storage::{FileKvStore, KvStore};
use aussie_test::{RecordingExecutor, TestCore};
use aussie_vfs::{FileStore, FileStoreOptions};

/// Origin the bridge under test accepts.
#[allow(dead_code)]
pub const ORIGIN: &str = "http://localhost";

/// Open a file store persisted under `dir`, as a fresh process would.
#[allow(dead_code)]
pub async fn open_disk_store(dir: &Path, bus: &EventBus) -> FileStore {
    let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::open(dir).await.unwrap());
    FileStore::open(kv, bus.clone(), FileStoreOptions::default())
        .await
        .unwrap()
}

/// A scheduler over `fs` driven by `executor`.
#[allow(dead_code)]
pub fn scheduler_over(fs: &FileStore, bus: &EventBus, executor: &RecordingExecutor) -> Scheduler {
    Scheduler::new(
        fs.clone(),
        bus.clone(),
        Arc::new(executor.clone()),
        SchedulerConfig::default(),
    )
    .unwrap()
}

/// A kernel over every component of `core`.
#[allow(dead_code)]
pub fn kernel_for(core: &TestCore, policy: CapabilityPolicy) -> Arc<Kernel> {
    let services = KernelServices {
        fs: core.fs.clone(),
        windows: core.windows.clone(),
        scheduler: core.scheduler.clone(),
        executor: Arc::new(core.executor.clone()),
        bus: core.bus.clone(),
    };
    Arc::new(Kernel::new(services, policy))
}

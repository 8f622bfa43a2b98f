//! Composition root: builds every component from config, once.

use std::sync::Arc;

use anyhow::{Context, Result};
use aussie_config::Config;
use aussie_events::EventBus;
use aussie_kernel::{Kernel, KernelServices};
use aussie_scheduler::Scheduler;
use aussie_storage::{FileKvStore, KvStore, MemoryKvStore};
use aussie_vfs::FileStore;
use aussie_windows::WindowRegistry;
use tracing::info;

use crate::config_bridge;
use crate::executor::ProcessExecutor;

/// Everything a command needs, wired to one bus.
///
/// `fs` and `scheduler` are unguarded handles for lifecycle work (flushing,
/// starting the tick loop). Requests go through `kernel`.
pub(crate) struct Runtime {
    pub(crate) kernel: Arc<Kernel>,
    pub(crate) fs: FileStore,
    pub(crate) scheduler: Scheduler,
}

/// Build the runtime described by `cfg`.
///
/// # Errors
///
/// Fails if the storage backend cannot be opened, the snapshot or task
/// list is corrupt, or the configured policy is invalid.
pub(crate) async fn boot(cfg: &Config) -> Result<Runtime> {
    let kv: Arc<dyn KvStore> = match cfg.storage.backend.as_str() {
        "memory" => Arc::new(MemoryKvStore::new()),
        _ => {
            let dir = config_bridge::data_dir(cfg)?;
            let store = FileKvStore::open(&dir)
                .await
                .with_context(|| format!("opening data directory {}", dir.display()))?;
            Arc::new(store)
        },
    };

    let bus = EventBus::new();
    let fs = FileStore::open(kv, bus.clone(), config_bridge::to_file_store_options(cfg))
        .await
        .context("opening file store")?;
    let windows = WindowRegistry::new(config_bridge::to_window_layout(cfg), bus.clone());
    let executor = Arc::new(ProcessExecutor);
    let scheduler = Scheduler::new(
        fs.clone(),
        bus.clone(),
        executor.clone(),
        config_bridge::to_scheduler_config(cfg),
    )
    .context("loading scheduled tasks")?;

    let policy = config_bridge::to_policy(cfg)?;
    let kernel = Arc::new(Kernel::new(
        KernelServices {
            fs: fs.clone(),
            windows,
            scheduler: scheduler.clone(),
            executor,
            bus,
        },
        policy,
    ));

    info!(user = %cfg.user.name, backend = %cfg.storage.backend, "Runtime booted");
    Ok(Runtime {
        kernel,
        fs,
        scheduler,
    })
}

impl Runtime {
    /// Persist the current tree.
    ///
    /// # Errors
    ///
    /// Fails if the backend write fails.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.fs.flush().await.context("flushing file store")
    }
}

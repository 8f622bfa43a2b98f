//! Test fixtures for common types.

use std::sync::Arc;

use aussie_events::EventBus;
use aussie_storage::MemoryKvStore;
use aussie_scheduler::{NewTask, Schedule};
use aussie_vfs::{FileStore, FileStoreOptions};
use aussie_windows::{WindowLayout, WindowRegistry};

/// Open a file store over a fresh in-memory backend.
///
/// # Panics
///
/// Panics if the store cannot be opened (never expected for memory).
pub async fn test_file_store(bus: &EventBus) -> FileStore {
    FileStore::open(
        Arc::new(MemoryKvStore::new()),
        bus.clone(),
        FileStoreOptions::default(),
    )
    .await
    .expect("memory-backed file store opens")
}

/// A window registry with the default 1280x800 layout.
#[must_use]
pub fn test_window_registry(bus: &EventBus) -> WindowRegistry {
    WindowRegistry::new(WindowLayout::default(), bus.clone())
}

/// A one-shot command task that runs immediately.
#[must_use]
pub fn test_task(name: &str) -> NewTask {
    NewTask::command(name, format!("echo {name}"), Schedule::Once)
}

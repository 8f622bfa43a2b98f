use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aussie_core::{Millis, VPath, now_millis};
use aussie_events::{EventBus, topics};
use aussie_vfs::FileStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::CommandExecutor;
use crate::task::{NewTask, ScheduledTask};

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Absolute path of the task list inside the file store.
    pub tasks_path: String,
    /// Period of the driving tick.
    pub tick_interval: Duration,
    /// Maximum characters kept in `lastResult`.
    pub preview_len: usize,
    /// Upper bound on a single executor call.
    pub exec_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tasks_path: "/system/scheduler/tasks.json".to_string(),
            tick_interval: Duration::from_secs(30),
            preview_len: 500,
            exec_timeout: Duration::from_secs(300),
        }
    }
}

struct Inner {
    fs: FileStore,
    bus: EventBus,
    executor: Arc<dyn CommandExecutor>,
    config: SchedulerConfig,
    tasks: Mutex<Vec<ScheduledTask>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a tick ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The task scheduler.
///
/// Cheap to clone; clones share one task list.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks_path", &self.inner.config.tasks_path)
            .field("tasks", &self.tasks().len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Load the task list from the file store, starting empty if the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTask`] for a relative tasks path,
    /// or a storage/serialization error if an existing file is unreadable.
    pub fn new(
        fs: FileStore,
        bus: EventBus,
        executor: Arc<dyn CommandExecutor>,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self> {
        if VPath::parse(&config.tasks_path).is_err() {
            return Err(SchedulerError::InvalidTask(format!(
                "tasks path must be absolute: {}",
                config.tasks_path
            )));
        }

        let tasks = if fs.exists(&config.tasks_path) {
            let raw = fs.read_file(&config.tasks_path)?;
            let tasks: Vec<ScheduledTask> = serde_json::from_str(&raw)
                .map_err(|e| SchedulerError::Serialization(e.to_string()))?;
            info!(count = tasks.len(), path = %config.tasks_path, "Loaded scheduled tasks");
            tasks
        } else {
            Vec::new()
        };

        Ok(Self {
            inner: Arc::new(Inner {
                fs,
                bus,
                executor,
                config,
                tasks: Mutex::new(tasks),
                in_flight: AtomicBool::new(false),
            }),
        })
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Add a task created now.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidTask`] for a bad definition, or a storage
    /// error if persisting fails.
    pub fn add_task(&self, task: NewTask) -> SchedulerResult<ScheduledTask> {
        self.add_task_at(task, now_millis())
    }

    /// Add a task as if created at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::add_task`].
    pub fn add_task_at(&self, task: NewTask, now: Millis) -> SchedulerResult<ScheduledTask> {
        let task = task.into_task(Uuid::new_v4().to_string(), now)?;
        self.tasks().push(task.clone());
        if let Err(e) = self.persist() {
            warn!(task_id = %task.id, error = %e, "Persist failed, task not scheduled");
            self.tasks().retain(|t| t.id != task.id);
            return Err(e);
        }

        info!(task_id = %task.id, name = %task.name, schedule = ?task.schedule, "Task scheduled");
        self.inner.bus.emit_or_log(
            topics::NOTIFICATION,
            serde_json::json!({
                "title": "Task scheduled",
                "message": task.name,
                "taskId": task.id,
            }),
        );
        Ok(task)
    }

    /// Remove a task.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NotFound`] for an unknown id, or a storage error.
    pub fn remove_task(&self, id: &str) -> SchedulerResult<()> {
        let (index, removed) = {
            let mut tasks = self.tasks();
            let index = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
            (index, tasks.remove(index))
        };
        if let Err(e) = self.persist() {
            warn!(task_id = %id, error = %e, "Persist failed, task kept");
            let mut tasks = self.tasks();
            let index = index.min(tasks.len());
            tasks.insert(index, removed);
            return Err(e);
        }
        debug!(task_id = %id, "Task removed");
        Ok(())
    }

    /// A copy of every task.
    #[must_use]
    pub fn list_tasks(&self) -> Vec<ScheduledTask> {
        self.tasks().clone()
    }

    /// A copy of one task.
    #[must_use]
    pub fn get_task(&self, id: &str) -> Option<ScheduledTask> {
        self.tasks().iter().find(|t| t.id == id).cloned()
    }

    /// Run one tick against the wall clock.
    pub async fn tick(&self) -> usize {
        self.tick_at(now_millis()).await
    }

    /// Run every due task as of `now`. Returns how many ran.
    ///
    /// Never fails: executor errors are recorded on the task. If another
    /// tick is still in flight, this one is skipped and returns zero.
    pub async fn tick_at(&self, now: Millis) -> usize {
        if self.inner.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Previous tick still running, skipping");
            return 0;
        }
        let _in_flight = InFlight(&self.inner.in_flight);

        let due: Vec<ScheduledTask> = self
            .tasks()
            .iter()
            .filter(|t| t.is_due(now))
            .cloned()
            .collect();
        if due.is_empty() {
            return 0;
        }

        debug!(due = due.len(), now, "Tick");
        for task in &due {
            self.run_task(task, now).await;
        }

        if let Err(e) = self.persist() {
            warn!(error = %e, "Failed to persist tasks after tick");
        }
        due.len()
    }

    /// Execute one task immediately, regardless of `nextRun`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NotFound`] for an unknown id, or a storage error.
    pub async fn run_now(&self, id: &str) -> SchedulerResult<ScheduledTask> {
        let task = self
            .get_task(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        self.run_task(&task, now_millis()).await;
        self.persist()?;
        self.get_task(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    /// Start the driving tick loop.
    ///
    /// Each tick runs on its own task so a slow tick never delays the
    /// timer; overlap is handled by the in-flight guard in
    /// [`Scheduler::tick_at`].
    #[must_use = "the loop runs until SchedulerHandle::stop is called"]
    pub fn start(&self) -> SchedulerHandle {
        let scheduler = self.clone();
        let period = self.inner.config.tick_interval;
        info!(period_ms = period.as_millis(), "Scheduler started");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await; // Skip first immediate tick
            loop {
                interval.tick().await;
                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    scheduler.tick().await;
                });
            }
        });

        SchedulerHandle { handle }
    }

    async fn run_task(&self, task: &ScheduledTask, now: Millis) {
        let config = &self.inner.config;
        let invocation = task.invocation();

        let (ok, result) = match tokio::time::timeout(
            config.exec_timeout,
            self.inner.executor.execute(&invocation),
        )
        .await
        {
            Ok(Ok(output)) if output.success() => {
                (true, preview(&output.stdout, config.preview_len))
            },
            Ok(Ok(output)) => {
                let detail = if output.stderr.is_empty() {
                    &output.stdout
                } else {
                    &output.stderr
                };
                (
                    false,
                    preview(
                        &format!("exit {}: {detail}", output.exit_code),
                        config.preview_len,
                    ),
                )
            },
            Ok(Err(e)) => (false, preview(&format!("error: {e}"), config.preview_len)),
            Err(_) => (
                false,
                format!("timeout after {}ms", config.exec_timeout.as_millis()),
            ),
        };

        {
            let mut tasks = self.tasks();
            // The task may have been removed while it ran.
            if let Some(stored) = tasks.iter_mut().find(|t| t.id == task.id) {
                stored.record_run(now, result.clone());
            }
        }

        if ok {
            debug!(task_id = %task.id, name = %task.name, "Task executed");
        } else {
            warn!(task_id = %task.id, name = %task.name, result = %result, "Task failed");
            self.inner.bus.emit_or_log(
                topics::NOTIFICATION,
                serde_json::json!({
                    "title": "Scheduled task failed",
                    "message": format!("{}: {result}", task.name),
                }),
            );
        }
        self.inner.bus.emit_or_log(
            topics::TASK_EXECUTED,
            serde_json::json!({
                "id": task.id,
                "name": task.name,
                "ok": ok,
                "result": result,
            }),
        );
    }

    /// Write the task list to the file store, creating its directory.
    fn persist(&self) -> SchedulerResult<()> {
        let json = serde_json::to_string_pretty(&*self.tasks())
            .map_err(|e| SchedulerError::Serialization(e.to_string()))?;

        let path = &self.inner.config.tasks_path;
        if let Some(parent) = VPath::parse(path).ok().and_then(|p| p.parent()) {
            self.inner.fs.mkdir(&parent.to_string())?;
        }
        self.inner.fs.write_file(path, &json, false)?;
        Ok(())
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<ScheduledTask>> {
        self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Truncate `text` to at most `max` characters, marking the cut.
fn preview(text: &str, max: usize) -> String {
    let trimmed = text.trim_end();
    match trimmed.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Handle to a running tick loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the loop. Ticks already started run to completion.
    pub fn stop(self) {
        self.handle.abort();
        info!("Scheduler stopped");
    }

    /// Whether the loop is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

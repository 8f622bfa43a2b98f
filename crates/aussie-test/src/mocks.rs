//! Mock implementations for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aussie_events::{Event, EventBus, Subscription};
use aussie_scheduler::{CommandExecutor, ExecError, ExecOutput, Invocation};
use serde_json::Value;

/// An executor that answers from a script and records every call.
///
/// Commands without a scripted response echo their command line back as
/// stdout. Flow and swarm invocations without a response are rejected as
/// unsupported.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    responses: Arc<Mutex<HashMap<String, Result<ExecOutput, ExecError>>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl RecordingExecutor {
    /// Create an executor with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output for an action (command line, flow name, or goal).
    #[must_use]
    pub fn with_output(self, action: impl Into<String>, output: ExecOutput) -> Self {
        self.lock_responses().insert(action.into(), Ok(output));
        self
    }

    /// Script a failing exit status for an action.
    #[must_use]
    pub fn with_exit(self, action: impl Into<String>, exit_code: i32, stderr: &str) -> Self {
        let output = ExecOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        };
        self.with_output(action, output)
    }

    /// Script an executor error for an action.
    #[must_use]
    pub fn with_error(self, action: impl Into<String>, error: ExecError) -> Self {
        self.lock_responses().insert(action.into(), Err(error));
        self
    }

    /// Every invocation received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock_calls().clone()
    }

    /// Number of invocations received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Result<ExecOutput, ExecError>>> {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Invocation>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        self.lock_calls().push(invocation.clone());

        let action = match invocation {
            Invocation::Command { command } => command,
            Invocation::Flow { flow } => flow,
            Invocation::Swarm { goal } => goal,
        };
        if let Some(response) = self.lock_responses().get(action) {
            return response.clone();
        }

        match invocation {
            Invocation::Command { command } => Ok(ExecOutput::ok(command.clone())),
            other => Err(ExecError::Unsupported(format!("{other:?}"))),
        }
    }
}

/// An executor that sleeps before succeeding, tracking peak concurrency.
#[derive(Debug, Clone)]
pub struct SlowExecutor {
    delay: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl SlowExecutor {
    /// Create an executor that takes `delay` per invocation.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest number of invocations that were running at the same time.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for SlowExecutor {
    async fn execute(&self, _invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ExecOutput::ok("done"))
    }
}

/// Records every event emitted on a bus.
#[derive(Debug)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
    subscription: Subscription,
}

impl EventRecorder {
    /// Start recording events from `bus`.
    #[must_use]
    pub fn attach(bus: &EventBus) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = bus.subscribe(move |event: &Event| {
            sink.lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event.clone());
            Ok(())
        });
        Self {
            events,
            subscription,
        }
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Event types in emission order.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }

    /// Payloads of events with the given type.
    #[must_use]
    pub fn payloads(&self, event_type: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .map(|e| e.payload)
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    /// Stop recording.
    pub fn detach(self) -> bool {
        self.subscription.unsubscribe()
    }
}

use aussie_core::Millis;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};
use crate::executor::Invocation;

const HOUR_MS: Millis = 3_600_000;
const DAY_MS: Millis = 86_400_000;

/// What kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// A shell-like command line.
    Command,
    /// A named flow.
    Flow,
    /// A goal handed to an agent swarm.
    Swarm,
}

/// When a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Exactly once, then completed.
    Once,
    /// Every `intervalSeconds`.
    Interval,
    /// Every hour.
    Hourly,
    /// Every day.
    Daily,
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Eligible to run.
    Active,
    /// A finished one-shot task. Terminal.
    Completed,
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Work kind.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Command line, flow name, or swarm goal.
    pub action: String,
    /// Recurrence.
    pub schedule: Schedule,
    /// Period for [`Schedule::Interval`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
    /// Earliest time of the next run.
    pub next_run: Millis,
    /// Time of the last run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<Millis>,
    /// Output preview or error from the last run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<String>,
    /// Lifecycle state.
    pub status: TaskStatus,
}

impl ScheduledTask {
    /// Milliseconds between runs, or `None` for one-shot tasks.
    #[must_use]
    pub fn period(&self) -> Option<Millis> {
        period_of(self.schedule, self.interval_seconds)
    }

    /// Whether the task should run at `now`.
    #[must_use]
    pub fn is_due(&self, now: Millis) -> bool {
        self.status == TaskStatus::Active && self.next_run <= now
    }

    /// The executor call for this task.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        match self.task_type {
            TaskType::Command => Invocation::Command {
                command: self.action.clone(),
            },
            TaskType::Flow => Invocation::Flow {
                flow: self.action.clone(),
            },
            TaskType::Swarm => Invocation::Swarm {
                goal: self.action.clone(),
            },
        }
    }

    /// Apply the state machine after a run at `now`.
    pub(crate) fn record_run(&mut self, now: Millis, result: String) {
        self.last_run = Some(now);
        self.last_result = Some(result);
        match self.period() {
            Some(period) => self.next_run = now.saturating_add(period),
            None => self.status = TaskStatus::Completed,
        }
    }
}

fn period_of(schedule: Schedule, interval_seconds: Option<u64>) -> Option<Millis> {
    match schedule {
        Schedule::Once => None,
        Schedule::Interval => interval_seconds
            .and_then(|secs| Millis::try_from(secs).ok())
            .map(|secs| secs.saturating_mul(1000)),
        Schedule::Hourly => Some(HOUR_MS),
        Schedule::Daily => Some(DAY_MS),
    }
}

/// Definition of a task to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Display name.
    pub name: String,
    /// Work kind.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Command line, flow name, or swarm goal.
    pub action: String,
    /// Recurrence.
    pub schedule: Schedule,
    /// Period for [`Schedule::Interval`]; required and non-zero there.
    #[serde(default)]
    pub interval_seconds: Option<u64>,
    /// First run time. Defaults to now for one-shot tasks and to one
    /// period from now for recurring ones.
    #[serde(default)]
    pub run_at: Option<Millis>,
}

impl NewTask {
    /// A command task.
    #[must_use]
    pub fn command(name: impl Into<String>, action: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            task_type: TaskType::Command,
            action: action.into(),
            schedule,
            interval_seconds: None,
            run_at: None,
        }
    }

    /// Set the interval period.
    #[must_use]
    pub fn every(mut self, seconds: u64) -> Self {
        self.interval_seconds = Some(seconds);
        self
    }

    /// Set the first run time.
    #[must_use]
    pub fn at(mut self, run_at: Millis) -> Self {
        self.run_at = Some(run_at);
        self
    }

    /// Validate and turn into an active task created at `now`.
    pub(crate) fn into_task(self, id: String, now: Millis) -> SchedulerResult<ScheduledTask> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::InvalidTask("name must not be empty".into()));
        }
        if self.action.trim().is_empty() {
            return Err(SchedulerError::InvalidTask("action must not be empty".into()));
        }

        let interval_seconds = match self.schedule {
            Schedule::Interval => match self.interval_seconds {
                Some(secs) if secs > 0 => Some(secs),
                _ => {
                    return Err(SchedulerError::InvalidTask(
                        "interval schedule requires intervalSeconds > 0".into(),
                    ));
                },
            },
            _ => None,
        };

        let next_run = match (self.run_at, period_of(self.schedule, interval_seconds)) {
            (Some(at), _) => at,
            (None, Some(period)) => now.saturating_add(period),
            (None, None) => now,
        };

        Ok(ScheduledTask {
            id,
            name: self.name,
            task_type: self.task_type,
            action: self.action,
            schedule: self.schedule,
            interval_seconds,
            next_run,
            last_run: None,
            last_result: None,
            status: TaskStatus::Active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_next_run() {
        let once = NewTask::command("a", "echo", Schedule::Once)
            .into_task("1".into(), 1000)
            .unwrap();
        assert_eq!(once.next_run, 1000);

        let interval = NewTask::command("b", "echo", Schedule::Interval)
            .every(60)
            .into_task("2".into(), 1000)
            .unwrap();
        assert_eq!(interval.next_run, 61_000);

        let daily = NewTask::command("c", "echo", Schedule::Daily)
            .at(5)
            .into_task("3".into(), 1000)
            .unwrap();
        assert_eq!(daily.next_run, 5);
    }

    #[test]
    fn test_interval_requires_seconds() {
        for task in [
            NewTask::command("a", "echo", Schedule::Interval),
            NewTask::command("a", "echo", Schedule::Interval).every(0),
        ] {
            assert!(matches!(
                task.into_task("1".into(), 0),
                Err(SchedulerError::InvalidTask(_))
            ));
        }
    }

    #[test]
    fn test_empty_action_rejected() {
        let res = NewTask::command("a", "  ", Schedule::Once).into_task("1".into(), 0);
        assert!(matches!(res, Err(SchedulerError::InvalidTask(_))));
    }

    #[test]
    fn test_record_run_state_machine() {
        let mut once = NewTask::command("a", "echo", Schedule::Once)
            .into_task("1".into(), 0)
            .unwrap();
        once.record_run(10, "ok".into());
        assert_eq!(once.status, TaskStatus::Completed);
        assert!(!once.is_due(i64::MAX));

        let mut hourly = NewTask::command("b", "echo", Schedule::Hourly)
            .into_task("2".into(), 0)
            .unwrap();
        hourly.record_run(HOUR_MS, "ok".into());
        assert_eq!(hourly.status, TaskStatus::Active);
        assert_eq!(hourly.next_run, 7_200_000);
        assert_eq!(hourly.last_run, Some(HOUR_MS));
    }

    #[test]
    fn test_wire_format() {
        let task = NewTask::command("a", "ls", Schedule::Interval)
            .every(30)
            .into_task("id-1".into(), 0)
            .unwrap();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "command");
        assert_eq!(json["schedule"], "interval");
        assert_eq!(json["intervalSeconds"], 30);
        assert_eq!(json["nextRun"], 30_000);
        assert_eq!(json["status"], "active");
        assert!(json.get("lastRun").is_none());
    }

    #[test]
    fn test_invocation_by_type() {
        let mut task = NewTask::command("a", "deploy", Schedule::Once)
            .into_task("1".into(), 0)
            .unwrap();
        task.task_type = TaskType::Swarm;
        assert_eq!(
            task.invocation(),
            Invocation::Swarm {
                goal: "deploy".into()
            }
        );
    }
}

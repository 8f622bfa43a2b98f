//! Scheduler state machine and persistence through the file store.

mod common;

use aussie_events::{EventBus, topics};
use aussie_scheduler::{NewTask, Schedule, TaskStatus};
use aussie_test::{RecordingExecutor, TestCore, test_dir, test_task};
use common::{open_disk_store, scheduler_over};

const T0: i64 = 1_700_000_000_000;

#[tokio::test]
async fn test_interval_task_reschedules_from_tick_time() {
    let core = TestCore::new().await;
    let task = core
        .scheduler
        .add_task_at(
            NewTask::command("poll", "curl -s status", Schedule::Interval).every(60),
            T0,
        )
        .unwrap();
    assert_eq!(task.next_run, T0 + 60_000);

    assert_eq!(core.scheduler.tick_at(T0 + 61_000).await, 1);
    let task = core.scheduler.get_task(&task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Active);
    assert_eq!(task.next_run, T0 + 61_000 + 60_000);
    assert_eq!(task.last_run, Some(T0 + 61_000));
}

#[tokio::test]
async fn test_once_task_runs_exactly_once() {
    let core = TestCore::new().await;
    let task = core.scheduler.add_task_at(test_task("report"), T0).unwrap();

    assert_eq!(core.scheduler.tick_at(T0 + 1).await, 1);
    assert_eq!(core.scheduler.tick_at(T0 + 2).await, 0);
    assert_eq!(core.executor.call_count(), 1);
    assert_eq!(
        core.scheduler.get_task(&task.id).unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn test_failures_notify_without_stopping_the_tick() {
    let executor = RecordingExecutor::new().with_exit("false", 1, "nope");
    let core = TestCore::with_executor(executor).await;
    core.scheduler
        .add_task_at(NewTask::command("bad", "false", Schedule::Once), T0)
        .unwrap();
    core.scheduler
        .add_task_at(NewTask::command("good", "echo fine", Schedule::Once), T0)
        .unwrap();
    core.events.clear();

    assert_eq!(core.scheduler.tick_at(T0).await, 2);
    let executed = core.events.payloads(topics::TASK_EXECUTED);
    assert_eq!(executed.len(), 2);
    assert!(executed.iter().any(|e| e["name"] == "bad" && e["ok"] == false));
    assert!(executed.iter().any(|e| e["name"] == "good" && e["ok"] == true));

    let notes = core.events.payloads(topics::NOTIFICATION);
    assert_eq!(notes.len(), 1);
    assert!(notes[0]["message"].as_str().unwrap().contains("exit 1: nope"));
}

#[tokio::test]
async fn test_task_list_survives_restart() {
    let dir = test_dir();
    let executor = RecordingExecutor::new();
    let id = {
        let bus = EventBus::new();
        let fs = open_disk_store(dir.path(), &bus).await;
        let scheduler = scheduler_over(&fs, &bus, &executor);
        let task = scheduler
            .add_task_at(NewTask::command("backup", "tar", Schedule::Daily), T0)
            .unwrap();
        fs.flush().await.unwrap();
        task.id
    };

    let bus = EventBus::new();
    let fs = open_disk_store(dir.path(), &bus).await;
    assert!(fs.exists("/system/scheduler/tasks.json"));
    let scheduler = scheduler_over(&fs, &bus, &executor);
    let task = scheduler.get_task(&id).unwrap();
    assert_eq!(task.name, "backup");
    assert_eq!(task.next_run, T0 + 86_400_000);
}

#[tokio::test]
async fn test_run_now_ignores_next_run() {
    let core = TestCore::new().await;
    let task = core
        .scheduler
        .add_task(NewTask::command("later", "echo later", Schedule::Daily))
        .unwrap();

    let ran = core.scheduler.run_now(&task.id).await.unwrap();
    assert_eq!(ran.status, TaskStatus::Active);
    assert!(ran.last_run.is_some());
    assert_eq!(core.executor.call_count(), 1);
}

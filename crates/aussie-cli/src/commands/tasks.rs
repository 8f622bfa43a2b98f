//! `aussie tasks` - manage the persisted task list.

use anyhow::Result;
use aussie_scheduler::{NewTask, Schedule, ScheduledTask, TaskStatus, TaskType};

use crate::boot::Runtime;
use crate::commands::fs::format_time;

/// A task operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TasksCommand {
    List,
    Add(NewTask),
    Remove { id: String },
    Run { id: String },
}

/// Run `command`, returning what to print.
///
/// # Errors
///
/// Propagates permission, validation, and persistence errors.
pub(crate) async fn run_tasks(rt: &Runtime, command: TasksCommand) -> Result<String> {
    let facade = rt.kernel.facade();
    let out = match command {
        TasksCommand::List => {
            let tasks = facade.list_tasks()?;
            if tasks.is_empty() {
                "No scheduled tasks".to_owned()
            } else {
                tasks.iter().map(render_task).collect::<Vec<_>>().join("\n")
            }
        },
        TasksCommand::Add(task) => {
            let task = facade.add_task(task)?;
            format!("Added {}", task.id)
        },
        TasksCommand::Remove { id } => {
            facade.remove_task(&id)?;
            format!("Removed {id}")
        },
        TasksCommand::Run { id } => {
            let task = facade.run_task(&id).await?;
            task.last_result.unwrap_or_default()
        },
    };
    Ok(out)
}

fn render_task(task: &ScheduledTask) -> String {
    let kind = match task.task_type {
        TaskType::Command => "command",
        TaskType::Flow => "flow",
        TaskType::Swarm => "swarm",
    };
    let schedule = match (task.schedule, task.interval_seconds) {
        (Schedule::Once, _) => "once".to_owned(),
        (Schedule::Interval, Some(secs)) => format!("every {secs}s"),
        (Schedule::Interval, None) => "interval".to_owned(),
        (Schedule::Hourly, _) => "hourly".to_owned(),
        (Schedule::Daily, _) => "daily".to_owned(),
    };
    let when = match task.status {
        TaskStatus::Active => format!("next {}", format_time(task.next_run)),
        TaskStatus::Completed => "completed".to_owned(),
    };
    format!(
        "{}  {} [{kind}, {schedule}, {when}]  {}",
        task.id, task.name, task.action
    )
}

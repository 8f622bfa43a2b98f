//! Aussie CLI - host for the web OS core.
//!
//! `aussie serve` exposes the kernel bridge over stdio for a UI shell to
//! drive. The other subcommands operate on the persisted state directly,
//! under the same capability policy.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use aussie_config::{Config, ConfigResult, ResolvedConfig, ShowFormat};
use aussie_scheduler::{NewTask, Schedule, TaskType};
use clap::{Parser, Subcommand, ValueEnum};

mod boot;
mod commands;
mod config_bridge;
mod executor;

use commands::fs::FsCommand;
use commands::tasks::TasksCommand;
use commands::{config, fs, serve, tasks};

/// Aussie - a web OS core
#[derive(Parser)]
#[command(name = "aussie")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file layered over ~/.aussie/config.toml
    #[arg(short, long, global = true, env = "AUSSIE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the kernel bridge over stdin/stdout (NDJSON)
    Serve {
        /// Do not run the task scheduler while serving
        #[arg(long)]
        no_scheduler: bool,
    },

    /// Work with the virtual file store
    Fs {
        #[command(subcommand)]
        command: FsCommands,
    },

    /// Manage scheduled tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// View and check configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum FsCommands {
    /// List a directory
    Ls {
        /// Directory path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file
    Cat {
        /// File path
        path: String,
    },
    /// Write a file, creating parent directories
    Write {
        /// File path
        path: String,
        /// New content
        content: String,
        /// Append instead of replacing
        #[arg(short, long)]
        append: bool,
    },
    /// Create a directory and its ancestors
    Mkdir {
        /// Directory path
        path: String,
    },
    /// Delete a file or directory tree
    Rm {
        /// Path to delete
        path: String,
    },
    /// Move or rename
    Mv {
        /// Source path
        from: String,
        /// Destination path (must not exist)
        to: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List,
    /// Add a task
    Add {
        /// Display name
        name: String,
        /// Command line, flow name, or swarm goal
        action: String,
        /// Recurrence
        #[arg(short, long, value_enum, default_value = "once")]
        schedule: ScheduleArg,
        /// Period in seconds for the interval schedule
        #[arg(long)]
        every: Option<u64>,
        /// Kind of work
        #[arg(short = 't', long = "type", value_enum, default_value = "command")]
        task_type: TaskTypeArg,
    },
    /// Remove a task
    Remove {
        /// Task id
        id: String,
    },
    /// Run a task immediately
    Run {
        /// Task id
        id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: FormatArg,
    },
    /// Validate the current configuration
    Validate,
    /// Show config, data, and log paths
    Paths,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScheduleArg {
    Once,
    Interval,
    Hourly,
    Daily,
}

impl From<ScheduleArg> for Schedule {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Once => Self::Once,
            ScheduleArg::Interval => Self::Interval,
            ScheduleArg::Hourly => Self::Hourly,
            ScheduleArg::Daily => Self::Daily,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TaskTypeArg {
    Command,
    Flow,
    Swarm,
}

impl From<TaskTypeArg> for TaskType {
    fn from(arg: TaskTypeArg) -> Self {
        match arg {
            TaskTypeArg::Command => Self::Command,
            TaskTypeArg::Flow => Self::Flow,
            TaskTypeArg::Swarm => Self::Swarm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Toml,
    Json,
}

impl From<FormatArg> for ShowFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Toml => Self::Toml,
            FormatArg::Json => Self::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());

    // Set up logging from config, with --verbose override.
    let log_config = match loaded.as_ref().map(|r| config_bridge::to_log_config(&r.config)) {
        Ok(Ok(mut lc)) => {
            if cli.verbose {
                "debug".clone_into(&mut lc.level);
            }
            lc
        },
        _ => {
            // Fallback if config loading fails.
            let level = if cli.verbose { "debug" } else { "info" };
            aussie_telemetry::LogConfig::new(level)
        },
    };
    if let Err(e) = aussie_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Config { command } => {
            print_output(&handle_config(command, cli.config.as_deref(), loaded)?);
        },
        Commands::Serve { no_scheduler } => {
            let cfg = loaded?.config;
            let rt = boot::boot(&cfg).await?;
            let start_scheduler = cfg.scheduler.enabled && !no_scheduler;
            serve::run_serve(rt, cfg.kernel.bridge_origin.clone(), start_scheduler).await?;
        },
        Commands::Fs { command } => {
            let rt = boot::boot(&loaded?.config).await?;
            let result = fs::run_fs(&rt, command.into());
            rt.shutdown().await?;
            print_output(&result?);
        },
        Commands::Tasks { command } => {
            let rt = boot::boot(&loaded?.config).await?;
            let result = tasks::run_tasks(&rt, command.into()).await;
            rt.shutdown().await?;
            print_output(&result?);
        },
    }

    Ok(())
}

fn handle_config(
    command: ConfigCommands,
    explicit: Option<&std::path::Path>,
    loaded: ConfigResult<ResolvedConfig>,
) -> Result<String> {
    match command {
        ConfigCommands::Show { format } => config::show_config(loaded, format.into()),
        ConfigCommands::Validate => config::validate_config(loaded),
        ConfigCommands::Paths => config::show_paths(explicit, loaded.as_ref().ok()),
    }
}

fn print_output(out: &str) {
    if !out.is_empty() {
        println!("{out}");
    }
}

impl From<FsCommands> for FsCommand {
    fn from(command: FsCommands) -> Self {
        match command {
            FsCommands::Ls { path } => Self::Ls { path },
            FsCommands::Cat { path } => Self::Cat { path },
            FsCommands::Write {
                path,
                content,
                append,
            } => Self::Write {
                path,
                content,
                append,
            },
            FsCommands::Mkdir { path } => Self::Mkdir { path },
            FsCommands::Rm { path } => Self::Rm { path },
            FsCommands::Mv { from, to } => Self::Mv { from, to },
        }
    }
}

impl From<TaskCommands> for TasksCommand {
    fn from(command: TaskCommands) -> Self {
        match command {
            TaskCommands::List => Self::List,
            TaskCommands::Add {
                name,
                action,
                schedule,
                every,
                task_type,
            } => {
                let mut task = NewTask::command(name, action, schedule.into());
                task.task_type = task_type.into();
                task.interval_seconds = every;
                Self::Add(task)
            },
            TaskCommands::Remove { id } => Self::Remove { id },
            TaskCommands::Run { id } => Self::Run { id },
        }
    }
}

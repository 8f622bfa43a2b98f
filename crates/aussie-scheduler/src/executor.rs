//! The seam to whatever actually runs a task.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One unit of work handed to a [`CommandExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Invocation {
    /// Run a shell-like command line.
    Command {
        /// The command line.
        command: String,
    },
    /// Run a named flow.
    Flow {
        /// Flow name.
        flow: String,
    },
    /// Hand a goal to an agent swarm.
    Swarm {
        /// Goal text.
        goal: String,
    },
}

/// Captured result of an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit status; zero is success.
    pub exit_code: i32,
}

impl ExecOutput {
    /// Successful output with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Whether the exit status is zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executor-level failure (the work could not be run at all).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// This executor cannot run this kind of invocation.
    #[error("Unsupported invocation: {0}")]
    Unsupported(String),

    /// The invocation could not be started or crashed.
    #[error("Execution failed: {0}")]
    Failed(String),
}

/// Runs invocations on behalf of the scheduler and the kernel's shell hook.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one invocation to completion.
    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError>;
}

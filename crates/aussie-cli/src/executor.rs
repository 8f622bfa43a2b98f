//! Host process executor.

use async_trait::async_trait;
use aussie_scheduler::{CommandExecutor, ExecError, ExecOutput, Invocation};
use tokio::process::Command;
use tracing::debug;

/// Runs command invocations with `sh -c` on the host.
///
/// Flow and swarm invocations belong to collaborators this binary does not
/// host, so they are reported as unsupported.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        let Invocation::Command { command } = invocation else {
            return Err(ExecError::Unsupported(format!(
                "no runner for {invocation:?}"
            )));
        };

        debug!(command = %command, "Spawning shell command");
        // Killed if the caller's timeout drops this future.
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExecError::Failed(format!("failed to spawn sh: {e}")))?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

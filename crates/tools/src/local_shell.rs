//! Local Shell Executor
//!
//! A `CommandExecutor` that runs commands on the host through `sh -c`. Used
//! when the agent runs outside a hosted sandbox (local development, tests).
//! Output is stdout followed by stderr, separated the same way the transcript
//! renders it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use toolstream_core::{CoreError, CoreResult};

use crate::executor::{CommandExecutor, CommandOutput};

/// Output beyond this many bytes is truncated.
const MAX_OUTPUT_BYTES: usize = 30_000;

/// Runs commands in a local shell.
#[derive(Debug, Clone)]
pub struct LocalShellExecutor {
    shell: String,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl LocalShellExecutor {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for LocalShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for LocalShellExecutor {
    async fn ready(&self) -> CoreResult<()> {
        match &self.working_dir {
            Some(dir) if !dir.is_dir() => Err(CoreError::not_found(format!(
                "Working directory does not exist: {}",
                dir.display()
            ))),
            _ => Ok(()),
        }
    }

    async fn execute_command(&self, command: &str) -> CoreResult<CommandOutput> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    CoreError::command(format!("Command timed out after {} ms", limit.as_millis()))
                })??,
            None => cmd.output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut result = stdout.into_owned();
        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push_str("\n\n--- stderr ---\n");
            }
            result.push_str(&stderr);
        }
        if result.len() > MAX_OUTPUT_BYTES {
            let mut cut = MAX_OUTPUT_BYTES;
            while !result.is_char_boundary(cut) {
                cut -= 1;
            }
            result.truncate(cut);
            result.push_str("\n\n... (output truncated)");
        }

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!("[LocalShell] '{}' exited with {}", command, exit_code);

        Ok(CommandOutput::new(result, exit_code))
    }
}

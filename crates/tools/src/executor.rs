//! Concurrent Command Execution
//!
//! Runs a finalized list of commands against an injected `CommandExecutor`
//! (normally a sandbox) and folds the outcomes into an `ExecutionSummary`.
//!
//! All commands run concurrently through `join_all`, which yields outputs in
//! input order no matter which command finishes first. Each command is
//! isolated: an executor error or panic marks only that command as failed.
//! Nothing in here returns an error or panics past `execute_commands`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use toolstream_core::CoreResult;

/// Summary message when there is nothing to run.
pub const NO_COMMANDS_MESSAGE: &str = "No commands provided";

/// Error attached to every command when no executor is available.
pub const SANDBOX_REQUIRED_ERROR: &str = "Command execution requires a sandbox environment";

/// Programs recognized as pattern-search invocations by default.
pub const DEFAULT_SEARCH_PROGRAMS: [&str; 5] = ["rg", "grep", "egrep", "fgrep", "ag"];

// ============================================================================
// Executor capability
// ============================================================================

/// Raw outcome reported by a command executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    /// Captured output text (stdout and stderr as the executor combines them)
    pub result: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(result: impl Into<String>, exit_code: i32) -> Self {
        Self {
            result: result.into(),
            exit_code,
        }
    }
}

/// Capability that runs a single shell-like command.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Check that the executor can accept work at all (e.g. the sandbox is
    /// reachable). A failure here fails the whole batch without running it.
    async fn ready(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Run one command and report its output and exit code.
    async fn execute_command(&self, command: &str) -> CoreResult<CommandOutput>;
}

// ============================================================================
// Success policies
// ============================================================================

/// Decides whether an exit code counts as success for a given command.
pub trait SuccessPolicy: Send + Sync {
    fn is_success(&self, command: &str, exit_code: i32) -> bool;
}

/// Only exit code 0 is success.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictExitCode;

impl SuccessPolicy for StrictExitCode {
    fn is_success(&self, _command: &str, exit_code: i32) -> bool {
        exit_code == 0
    }
}

/// Search tools exit with 1 when nothing matched; that is an empty result,
/// not a failure. Exit code 1 is accepted only for commands whose program is
/// one of the configured search programs.
#[derive(Debug, Clone)]
pub struct SearchSuccessPolicy {
    programs: Vec<String>,
}

impl SearchSuccessPolicy {
    pub fn new<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            programs: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    /// Whether the program deciding the command's exit status is a
    /// configured search program.
    ///
    /// That program is the first word of the last pipeline stage or list
    /// element (after `|`, `&&`, `||`, `;` or `&` outside quotes), skipping
    /// leading `NAME=value` assignments, with any directory stripped.
    pub fn is_search_command(&self, command: &str) -> bool {
        let last = &command[last_segment_start(command)..];
        let Some(first) = last.split_whitespace().find(|token| !is_assignment(token)) else {
            return false;
        };
        let program = first.rsplit('/').next().unwrap_or(first);
        self.programs.iter().any(|p| p == program)
    }
}

/// Byte offset just past the last unquoted list or pipe separator.
fn last_segment_start(command: &str) -> usize {
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = ' ';
    let mut chars = command.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        let preceding = std::mem::replace(&mut prev, c);
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some('"'), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            // `2>&1`, `<&3` and `&>file` are redirections.
            (None, '&') if matches!(preceding, '>' | '<') || next == Some('>') => {}
            (None, ';' | '&' | '|') => start = i + 1,
            (None, _) => {}
        }
    }
    start
}

fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            let mut chars = name.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

impl Default for SearchSuccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_PROGRAMS)
    }
}

impl SuccessPolicy for SearchSuccessPolicy {
    fn is_success(&self, command: &str, exit_code: i32) -> bool {
        exit_code == 0 || (exit_code == 1 && self.is_search_command(command))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    /// The exact command string that was executed
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    /// Create a successful result
    pub fn succeeded(command: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            command: command.into(),
            stdout: Some(stdout.into()),
            stderr: None,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failed(
        command: impl Into<String>,
        error: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self {
            success: false,
            command: command.into(),
            stdout: None,
            stderr,
            error: Some(error.into()),
        }
    }

    /// Render for LLM consumption
    pub fn to_content(&self) -> String {
        if self.success {
            let stdout = self.stdout.as_deref().unwrap_or_default();
            if stdout.is_empty() {
                format!("$ {}\n(no output)", self.command)
            } else {
                format!("$ {}\n{}", self.command, stdout)
            }
        } else {
            let mut content = format!(
                "$ {}\nError: {}",
                self.command,
                self.error.as_deref().unwrap_or("Unknown error")
            );
            if let Some(stderr) = self.stderr.as_deref().filter(|s| !s.is_empty()) {
                content.push('\n');
                content.push_str(stderr);
            }
            content
        }
    }
}

/// Terminal output of a batch execution. `results[i]` always belongs to
/// `commands[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub message: String,
    pub duration_ms: u64,
    pub results: Vec<CommandResult>,
}

impl ExecutionSummary {
    fn completed(results: Vec<CommandResult>, elapsed: Duration) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|r| r.success).count();
        let message = format!(
            "Executed {} command{} ({} succeeded, {} failed)",
            total,
            if total == 1 { "" } else { "s" },
            succeeded,
            total - succeeded
        );
        Self {
            message,
            duration_ms: elapsed.as_millis() as u64,
            results,
        }
    }

    fn all_failed(commands: &[String], error: &str, message: String, elapsed: Duration) -> Self {
        Self {
            message,
            duration_ms: elapsed.as_millis() as u64,
            results: commands
                .iter()
                .map(|command| CommandResult::failed(command, error, None))
                .collect(),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    /// Render for LLM consumption
    pub fn to_content(&self) -> String {
        let mut content = self.message.clone();
        for result in &self.results {
            content.push_str("\n\n");
            content.push_str(&result.to_content());
        }
        content
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Run every command concurrently and summarize the outcomes.
pub async fn execute_commands(
    commands: &[String],
    executor: Option<&dyn CommandExecutor>,
    policy: &dyn SuccessPolicy,
) -> ExecutionSummary {
    let started = Instant::now();

    if commands.is_empty() {
        return ExecutionSummary {
            message: NO_COMMANDS_MESSAGE.to_string(),
            duration_ms: 0,
            results: Vec::new(),
        };
    }

    let Some(executor) = executor else {
        tracing::warn!(
            "[Execute] No command executor available, {} command(s) not run",
            commands.len()
        );
        return ExecutionSummary::all_failed(
            commands,
            SANDBOX_REQUIRED_ERROR,
            SANDBOX_REQUIRED_ERROR.to_string(),
            started.elapsed(),
        );
    };

    let batch = AssertUnwindSafe(run_batch(commands, executor, policy))
        .catch_unwind()
        .await;

    let outcome = match batch {
        Ok(outcome) => outcome,
        Err(payload) => Err(panic_message(payload.as_ref())),
    };

    let summary = match outcome {
        Ok(results) => ExecutionSummary::completed(results, started.elapsed()),
        Err(reason) => {
            tracing::error!("[Execute] Batch execution failed: {}", reason);
            ExecutionSummary::all_failed(
                commands,
                &reason,
                format!("Execution failed: {}", reason),
                started.elapsed(),
            )
        }
    };

    tracing::info!(
        "[Execute] {} in {} ms",
        summary.message,
        summary.duration_ms
    );
    summary
}

async fn run_batch(
    commands: &[String],
    executor: &dyn CommandExecutor,
    policy: &dyn SuccessPolicy,
) -> Result<Vec<CommandResult>, String> {
    executor.ready().await.map_err(|e| e.to_string())?;

    let runs = commands
        .iter()
        .map(|command| run_command(command, executor, policy));
    Ok(join_all(runs).await)
}

async fn run_command(
    command: &str,
    executor: &dyn CommandExecutor,
    policy: &dyn SuccessPolicy,
) -> CommandResult {
    let outcome = AssertUnwindSafe(executor.execute_command(command))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(output)) => classify(command, output, policy),
        Ok(Err(e)) => {
            tracing::warn!("[Execute] Command '{}' errored: {}", command, e);
            CommandResult::failed(command, e.to_string(), None)
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::warn!("[Execute] Command '{}' panicked: {}", command, reason);
            CommandResult::failed(command, format!("Command panicked: {}", reason), None)
        }
    }
}

fn classify(command: &str, output: CommandOutput, policy: &dyn SuccessPolicy) -> CommandResult {
    let text = output.result.trim().to_string();
    if policy.is_success(command, output.exit_code) {
        CommandResult::succeeded(command, text)
    } else {
        CommandResult::failed(
            command,
            format!("Command failed with exit code {}", output.exit_code),
            Some(text),
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

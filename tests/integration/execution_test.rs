//! Execution Integration Tests
//!
//! Runs grep search batches through the tool surface with scripted and real
//! executors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use toolstream::{GrepSearchInput, GrepSearchTool};
use toolstream_core::{CoreError, CoreResult, ToolContext, ToolExecutable};
use toolstream_tools::{
    CommandExecutor, CommandOutput, ExecutionSummary, LocalShellExecutor, NO_COMMANDS_MESSAGE,
    SANDBOX_REQUIRED_ERROR,
};

/// Executor answering from a script, after a per-command delay.
#[derive(Default)]
struct DelayedExecutor {
    script: HashMap<String, (u64, CommandOutput)>,
    finished: Mutex<Vec<String>>,
}

impl DelayedExecutor {
    fn with(mut self, command: &str, delay_ms: u64, result: &str, exit_code: i32) -> Self {
        self.script.insert(
            command.to_string(),
            (delay_ms, CommandOutput::new(result, exit_code)),
        );
        self
    }

    fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for DelayedExecutor {
    async fn execute_command(&self, command: &str) -> CoreResult<CommandOutput> {
        let (delay, output) = self
            .script
            .get(command)
            .cloned()
            .ok_or_else(|| CoreError::command(format!("unscripted: {}", command)))?;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.finished.lock().unwrap().push(command.to_string());
        Ok(output)
    }
}

fn ctx() -> ToolContext {
    ToolContext::new("msg_1", "call_1")
}

#[tokio::test]
async fn test_results_follow_input_order_not_completion_order() {
    let executor = Arc::new(
        DelayedExecutor::default()
            .with("rg slow", 200, "slow.rs:1:hit\n", 0)
            .with("rg medium", 150, "medium.rs:2:hit\n", 0)
            .with("rg fast", 10, "fast.rs:3:hit\n", 0),
    );
    let tool = GrepSearchTool::new(Some(executor.clone()));

    let summary = tool
        .run(&GrepSearchInput::new(["rg slow", "rg medium", "rg fast"]))
        .await;

    assert_eq!(executor.finished(), vec!["rg fast", "rg medium", "rg slow"]);
    let commands: Vec<&str> = summary.results.iter().map(|r| r.command.as_str()).collect();
    assert_eq!(commands, vec!["rg slow", "rg medium", "rg fast"]);
    assert_eq!(summary.results[0].stdout.as_deref(), Some("slow.rs:1:hit"));
    assert!(summary.all_succeeded());
    // Concurrent: total time is bounded by the slowest command, not the sum.
    assert!(summary.duration_ms < 340, "took {} ms", summary.duration_ms);
}

#[tokio::test]
async fn test_empty_input_never_reaches_executor() {
    let executor = Arc::new(DelayedExecutor::default());
    let tool = GrepSearchTool::new(Some(executor.clone()));

    let value = tool.execute(&ctx(), json!({"commands": []})).await.unwrap();
    let summary: ExecutionSummary = serde_json::from_value(value).unwrap();

    assert_eq!(summary.message, NO_COMMANDS_MESSAGE);
    assert!(summary.results.is_empty());
    assert!(executor.finished().is_empty());
}

#[tokio::test]
async fn test_missing_sandbox_fails_every_command() {
    let tool = GrepSearchTool::new(None);
    let summary = tool
        .run(&GrepSearchInput::new(["rg a", "grep b", "ls"]))
        .await;

    assert_eq!(summary.results.len(), 3);
    for (result, command) in summary.results.iter().zip(["rg a", "grep b", "ls"]) {
        assert_eq!(result.command, command);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(SANDBOX_REQUIRED_ERROR));
    }
}

#[tokio::test]
async fn test_no_match_search_is_success_but_other_failures_are_not() {
    let executor = Arc::new(
        DelayedExecutor::default()
            .with("rg nothing-here", 0, "", 1)
            .with("grep -r missing .", 0, "", 1)
            .with("cat absent.txt", 0, "cat: absent.txt: No such file", 1)
            .with("rg --bad-flag x", 0, "rg: unknown flag", 2),
    );
    let tool = GrepSearchTool::new(Some(executor));

    let summary = tool
        .run(&GrepSearchInput::new([
            "rg nothing-here",
            "grep -r missing .",
            "cat absent.txt",
            "rg --bad-flag x",
        ]))
        .await;

    assert!(summary.results[0].success);
    assert_eq!(summary.results[0].stdout.as_deref(), Some(""));
    assert!(summary.results[1].success);

    assert!(!summary.results[2].success);
    assert_eq!(
        summary.results[2].error.as_deref(),
        Some("Command failed with exit code 1")
    );
    assert_eq!(
        summary.results[2].stderr.as_deref(),
        Some("cat: absent.txt: No such file")
    );
    assert_eq!(
        summary.results[3].error.as_deref(),
        Some("Command failed with exit code 2")
    );
    assert_eq!(summary.message, "Executed 4 commands (2 succeeded, 2 failed)");
}

#[tokio::test]
async fn test_executor_error_is_isolated_to_its_command() {
    let executor = Arc::new(DelayedExecutor::default().with("rg ok", 0, "ok.rs:1", 0));
    let tool = GrepSearchTool::new(Some(executor));

    let summary = tool
        .run(&GrepSearchInput::new(["rg ok", "rg unscripted"]))
        .await;

    assert!(summary.results[0].success);
    assert!(!summary.results[1].success);
    assert!(summary.results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("unscripted"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_shell_grep_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "alpha\nbeta\ngamma\n").unwrap();

    let executor = LocalShellExecutor::new().with_working_dir(dir.path());
    let tool = GrepSearchTool::new(Some(Arc::new(executor)));

    let summary = tool
        .run(&GrepSearchInput::new([
            "grep -n beta notes.txt",
            "grep -n delta notes.txt",
            "grep beta missing.txt",
        ]))
        .await;

    assert_eq!(summary.results[0].stdout.as_deref(), Some("2:beta"));
    assert!(summary.results[1].success, "no match is not a failure");
    assert!(!summary.results[2].success, "grep exits 2 on a missing file");
    assert_eq!(
        summary.results[2].error.as_deref(),
        Some("Command failed with exit code 2")
    );
    assert!(summary.to_content().contains("$ grep -n beta notes.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_shell_missing_working_dir_fails_batch() {
    let executor = LocalShellExecutor::new().with_working_dir("/definitely/not/here");
    let tool = GrepSearchTool::new(Some(Arc::new(executor)));

    let summary = tool.run(&GrepSearchInput::new(["grep a b", "grep c d"])).await;

    assert_eq!(summary.results.len(), 2);
    assert!(summary.results.iter().all(|r| !r.success));
    assert!(summary.message.starts_with("Execution failed:"));
}

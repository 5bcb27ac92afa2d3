//! Config Integration Tests

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use toolstream::{GrepSearchInput, GrepSearchTool, ToolstreamConfig};
use toolstream_core::{ToolContext, ToolDefinitionTrait, ToolExecutable};
use toolstream_tools::ExecutionSummary;

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
toolName = "codeSearch"
searchPrograms = ["rg", "git"]
shell = "sh"
commandTimeoutSecs = 5
"#
    )
    .unwrap();

    let config = ToolstreamConfig::from_file(file.path()).unwrap();
    assert_eq!(config.tool_name, "codeSearch");
    assert_eq!(config.command_timeout_secs, Some(5));

    let policy = config.search_policy();
    assert!(policy.is_search_command("git grep foo"));
    assert!(!policy.is_search_command("grep foo"));
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "commandTimeoutSecs = 0").unwrap();
    assert!(ToolstreamConfig::from_file(file.path()).is_err());
}

#[tokio::test]
async fn test_tool_named_from_config() {
    let config: ToolstreamConfig = toml::from_str(r#"toolName = "codeSearch""#).unwrap();
    let tool = GrepSearchTool::from_config(&config, None);
    assert_eq!(tool.name(), "codeSearch");

    let value = tool
        .execute(&ToolContext::new("m", "c"), json!({"commands": ["rg x"]}))
        .await
        .unwrap();
    let summary: ExecutionSummary = serde_json::from_value(value).unwrap();
    assert_eq!(summary.failed_count(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_executor_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "needle\n").unwrap();

    let config = toolstream::ToolstreamConfigBuilder::new()
        .working_dir(dir.path())
        .command_timeout_secs(10)
        .build()
        .unwrap();
    let tool = GrepSearchTool::from_config(&config, Some(Arc::new(config.local_executor())));

    let summary = tool
        .run(&GrepSearchInput::new(["grep -c needle a.txt"]))
        .await;
    assert_eq!(summary.results[0].stdout.as_deref(), Some("1"));
}

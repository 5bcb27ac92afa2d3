//! Grep search tool: executes the finalized commands in the sandbox.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use toolstream_core::{CoreError, CoreResult, ToolContext, ToolDefinitionTrait, ToolExecutable};
use toolstream_tools::{execute_commands, CommandExecutor, ExecutionSummary, SearchSuccessPolicy};

use super::GrepSearchInput;
use crate::models::{ToolstreamConfig, DEFAULT_TOOL_NAME};

const DESCRIPTION: &str = "Search files with pattern-search shell commands (rg, grep, ...). \
All commands run concurrently; results are returned in the order given. \
A search that finds no matches is reported as a success with empty output.";

pub struct GrepSearchTool {
    name: String,
    executor: Option<Arc<dyn CommandExecutor>>,
    policy: SearchSuccessPolicy,
}

impl GrepSearchTool {
    pub fn new(executor: Option<Arc<dyn CommandExecutor>>) -> Self {
        Self {
            name: DEFAULT_TOOL_NAME.to_string(),
            executor,
            policy: SearchSuccessPolicy::default(),
        }
    }

    /// Tool named and configured from settings.
    pub fn from_config(config: &ToolstreamConfig, executor: Option<Arc<dyn CommandExecutor>>) -> Self {
        Self {
            name: config.tool_name.clone(),
            executor,
            policy: config.search_policy(),
        }
    }

    /// Run the commands of `input`.
    pub async fn run(&self, input: &GrepSearchInput) -> ExecutionSummary {
        execute_commands(&input.commands, self.executor.as_deref(), &self.policy).await
    }
}

impl ToolDefinitionTrait for GrepSearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        GrepSearchInput::parameters_schema()
    }

    fn required_permissions(&self) -> Vec<String> {
        vec!["sandbox:execute".to_string()]
    }

    fn is_long_running(&self) -> bool {
        true
    }
}

#[async_trait]
impl ToolExecutable for GrepSearchTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let input: GrepSearchInput = serde_json::from_value(args)
            .map_err(|e| CoreError::validation(format!("Invalid grep search arguments: {}", e)))?;
        tracing::debug!(
            "[Execute] {} running {} command(s) for {} in {}",
            self.name,
            input.commands.len(),
            ctx.tool_call_id(),
            ctx.message_id()
        );
        let summary = self.run(&input).await;
        Ok(serde_json::to_value(summary)?)
    }
}

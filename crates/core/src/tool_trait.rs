//! Unified Tool Trait
//!
//! Split definition/execution traits for tools the agent can call:
//!
//! - `ToolDefinitionTrait` - Identity, schema, permissions
//! - `ToolExecutable` - Execution capability
//! - `UnifiedTool` - Combined trait (auto-implemented via blanket impl)
//! - `UnifiedToolRegistry` - the tools a host can dispatch completed calls to
//!
//! Prompt builders only need `ToolSchema`s; the stream router only needs
//! `dispatch`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// Trait Definitions
// ============================================================================

/// Tool definition metadata trait.
pub trait ToolDefinitionTrait: Send + Sync {
    /// Unique name of this tool (e.g., "grepSearch").
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// JSON schema describing input parameters.
    fn parameters_schema(&self) -> Value;

    /// Permissions required by this tool, e.g. `"sandbox:execute"`.
    fn required_permissions(&self) -> Vec<String> {
        vec![]
    }

    /// Whether this tool is potentially long-running.
    fn is_long_running(&self) -> bool {
        false
    }
}

/// Tool execution trait.
#[async_trait]
pub trait ToolExecutable: Send + Sync {
    /// Execute the tool with arguments matching `parameters_schema()`.
    ///
    /// Runtime failures that are part of the tool's result (a failed command,
    /// a missing sandbox) belong in the returned value. `Err` is for contract
    /// violations such as arguments that do not match the schema.
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value>;
}

/// Combined trait for tools that provide both definition and execution.
pub trait UnifiedTool: ToolDefinitionTrait + ToolExecutable {}

impl<T: ToolDefinitionTrait + ToolExecutable> UnifiedTool for T {}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_permissions: Vec<String>,
    pub long_running: bool,
}

impl ToolSchema {
    fn of(tool: &dyn UnifiedTool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters_schema(),
            required_permissions: tool.required_permissions(),
            long_running: tool.is_long_running(),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Tools available to completed tool calls, in registration order.
///
/// Built by the host and passed by reference; tool names are unique.
#[derive(Default)]
pub struct UnifiedToolRegistry {
    tools: Vec<Arc<dyn UnifiedTool>>,
}

impl UnifiedToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A tool with the same name is replaced in place and returned.
    pub fn register(&mut self, tool: Arc<dyn UnifiedTool>) -> Option<Arc<dyn UnifiedTool>> {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => Some(std::mem::replace(slot, tool)),
            None => {
                self.tools.push(tool);
                None
            }
        }
    }

    pub fn lookup(&self, name: &str) -> CoreResult<&Arc<dyn UnifiedTool>> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| CoreError::not_found(format!("Tool not found: {}", name)))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| ToolSchema::of(&**t)).collect()
    }

    /// Run the named tool for one call.
    pub async fn dispatch(&self, name: &str, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        self.lookup(name)?.execute(ctx, args).await
    }
}

//! Grep Search Tool
//!
//! Streaming reconciliation and execution for the `grepSearch` tool, which
//! runs a batch of pattern-search shell commands (`rg`, `grep`, ...) in the
//! sandbox:
//! - `state` - per-invocation accumulator of raw argument text and commands
//! - `transform` - progress entry and transcript entry builders
//! - `lifecycle` - start / delta / finish state machine publishing to a sink
//! - `tool` - `UnifiedTool` implementation running the finalized commands

pub mod lifecycle;
pub mod state;
pub mod tool;
pub mod transform;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use toolstream_core::{CoreError, CoreResult};

use crate::services::persistence::MessageSink;
use crate::services::router::{ToolStreamHandler, ToolStreamRegistry};

pub use lifecycle::GrepSearchInvocation;
pub use state::{LifecyclePhase, ToolInvocationState};
pub use tool::GrepSearchTool;
pub use transform::{build_progress_entry, build_transcript_entry, progress_message};

/// Finalized arguments of a grep search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepSearchInput {
    pub commands: Vec<String>,
}

impl GrepSearchInput {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Decode and validate the complete argument text of a finished call.
    pub fn from_arguments(arguments: &str) -> CoreResult<Self> {
        let input: Self = serde_json::from_str(arguments)
            .map_err(|e| CoreError::validation(format!("Invalid grep search arguments: {}", e)))?;
        input.validate()?;
        Ok(input)
    }

    /// Commands must be a non-empty list of non-empty strings.
    pub fn validate(&self) -> CoreResult<()> {
        if self.commands.is_empty() {
            return Err(CoreError::validation("commands must contain at least one command"));
        }
        if let Some(index) = self.commands.iter().position(|c| c.trim().is_empty()) {
            return Err(CoreError::validation(format!(
                "commands[{}] must be a non-empty string",
                index
            )));
        }
        Ok(())
    }

    /// JSON schema advertised to the LLM.
    pub fn parameters_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "commands": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "minItems": 1,
                    "description": "Shell search commands to run concurrently, e.g. rg -n \"pattern\" src/"
                }
            },
            "required": ["commands"]
        })
    }
}

/// Register the grep search stream handler under `tool_name`.
pub fn register_stream_handler(
    registry: &mut ToolStreamRegistry,
    tool_name: &str,
    sink: Arc<dyn MessageSink>,
) {
    let name = tool_name.to_string();
    registry.register(tool_name, move |message_id: &str| {
        Box::new(GrepSearchInvocation::new(message_id, name.clone(), sink.clone()))
            as Box<dyn ToolStreamHandler>
    });
}

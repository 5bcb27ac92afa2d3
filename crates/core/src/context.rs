//! Tool Execution Context
//!
//! The immutable per-call information a tool receives when executed: which
//! persisted message the call belongs to and which tool call it is.

/// Context for tool-level execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Persisted message the tool call's entries are written to.
    message_id: String,
    /// Unique identifier for this specific tool call.
    tool_call_id: String,
}

impl ToolContext {
    pub fn new(message_id: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }
}

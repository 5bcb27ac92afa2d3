//! Unified Stream Event Types
//!
//! Provider-agnostic events describing an LLM response as it streams. The
//! tool-call router consumes the `Tool*` variants and treats `Error` and
//! `Complete` as the end of the stream; text deltas pass through untouched.

use serde::{Deserialize, Serialize};

/// Unified streaming event emitted by the host agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnifiedStreamEvent {
    /// Text content delta from the model
    TextDelta { content: String },

    /// Start of a tool call
    ToolStart { tool_id: String, tool_name: String },

    /// Fragment of the tool call's JSON arguments
    ToolDelta { tool_id: String, delta: String },

    /// Tool call complete with accumulated arguments
    ToolComplete {
        tool_id: String,
        tool_name: String,
        /// Complete JSON string of tool arguments
        arguments: String,
    },

    /// Provider error; the stream ends after it
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

impl UnifiedStreamEvent {
    /// Tool call id this event belongs to, if it is a tool event.
    pub fn tool_id(&self) -> Option<&str> {
        match self {
            UnifiedStreamEvent::ToolStart { tool_id, .. }
            | UnifiedStreamEvent::ToolDelta { tool_id, .. }
            | UnifiedStreamEvent::ToolComplete { tool_id, .. } => Some(tool_id),
            _ => None,
        }
    }
}

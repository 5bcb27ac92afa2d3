//! Message Entry Models
//!
//! The two shapes a tool invocation is published as: a UI-facing response
//! entry and the assistant transcript message sent back to the LLM.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the sink applies a published entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Add a new entry
    Append,
    /// Replace the entry with the same id
    Update,
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::Append => write!(f, "append"),
            UpdateMode::Update => write!(f, "update"),
        }
    }
}

/// Progress state shown next to a response entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Loading,
    Completed,
}

/// UI-facing progress entry for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    /// Entry id; equals the tool call id for tool invocations
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Short human-readable progress text
    pub message: String,
    pub status: EntryStatus,
}

impl ResponseEntry {
    /// Create a text entry.
    pub fn text(id: impl Into<String>, message: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            id: id.into(),
            entry_type: "text".to_string(),
            message: message.into(),
            status,
        }
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Assistant,
    Tool,
}

/// "Assistant issued a tool call" payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    pub tool_call_id: String,
    pub tool_name: String,
    /// Tool arguments known so far; keys that are still unknown are omitted
    pub input: Value,
}

/// One part of a transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    ToolCall(ToolCallPart),
}

/// Transcript entry appended to the LLM conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLlmMessage {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

impl RawLlmMessage {
    /// Assistant message carrying a single tool call.
    pub fn tool_call(part: ToolCallPart) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentPart::ToolCall(part)],
        }
    }

    /// The first tool call in this message, if any.
    pub fn first_tool_call(&self) -> Option<&ToolCallPart> {
        self.content.iter().find_map(|part| match part {
            ContentPart::ToolCall(call) => Some(call),
        })
    }
}

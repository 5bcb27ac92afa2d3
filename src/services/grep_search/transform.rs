//! Builders for the two published shapes of a grep search invocation.

use serde_json::{json, Map, Value};

use super::state::ToolInvocationState;
use crate::models::{EntryStatus, RawLlmMessage, ResponseEntry, ToolCallPart};

/// Progress text for a given number of known commands.
pub fn progress_message(count: usize) -> String {
    match count {
        0 => "Preparing search commands...".to_string(),
        1 => "Running 1 search...".to_string(),
        n => format!("Running {} searches...", n),
    }
}

fn resolve_id(state: &ToolInvocationState, fallback_id: &str) -> Option<String> {
    state
        .entry_id
        .clone()
        .or_else(|| (!fallback_id.is_empty()).then(|| fallback_id.to_string()))
}

/// UI progress entry, or `None` when no entry id can be determined.
pub fn build_progress_entry(
    state: &ToolInvocationState,
    fallback_id: &str,
    status: EntryStatus,
) -> Option<ResponseEntry> {
    let id = resolve_id(state, fallback_id)?;
    Some(ResponseEntry::text(
        id,
        progress_message(state.command_count()),
        status,
    ))
}

/// Assistant transcript message carrying the tool call as known so far.
pub fn build_transcript_entry(
    state: &ToolInvocationState,
    fallback_id: &str,
    tool_name: &str,
) -> Option<RawLlmMessage> {
    let id = resolve_id(state, fallback_id)?;
    let mut input = Map::new();
    if let Some(commands) = &state.commands {
        input.insert("commands".to_string(), json!(commands));
    }
    Some(RawLlmMessage::tool_call(ToolCallPart {
        tool_call_id: id,
        tool_name: tool_name.to_string(),
        input: Value::Object(input),
    }))
}

//! Per-invocation state of a streaming grep search call.

use serde::{Deserialize, Serialize};
use toolstream_core::{get_optimistic_as, parse_optimistic};

/// Lifecycle phase of one invocation. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    NotStarted,
    Started,
    Streaming,
    Finished,
}

impl LifecyclePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, LifecyclePhase::Finished)
    }
}

/// Mutable record of one in-flight tool call.
///
/// `accumulated_args_text` is the raw argument stream; `commands` is its
/// best-known typed projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationState {
    pub entry_id: Option<String>,
    pub accumulated_args_text: Option<String>,
    pub commands: Option<Vec<String>>,
}

impl ToolInvocationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry id unless one is already assigned.
    pub fn ensure_entry_id(&mut self, invocation_id: &str) {
        if self.entry_id.is_none() {
            self.entry_id = Some(invocation_id.to_string());
        }
    }

    /// Append a raw argument fragment.
    pub fn push_fragment(&mut self, fragment: &str) {
        self.accumulated_args_text
            .get_or_insert_with(String::new)
            .push_str(fragment);
    }

    /// Decode `commands` from the accumulated text.
    ///
    /// Returns `Some` only for a non-empty array of strings.
    pub fn extract_commands(&self) -> Option<Vec<String>> {
        let text = self.accumulated_args_text.as_deref()?;
        let parsed = parse_optimistic(text);
        get_optimistic_as::<Vec<String>>(&parsed.extracted_values, "commands")
            .filter(|commands| !commands.is_empty())
    }

    /// Adopt newly extracted commands. Returns true when the value changed.
    pub fn apply_extracted(&mut self, commands: Vec<String>) -> bool {
        if self.commands.as_ref() == Some(&commands) {
            return false;
        }
        self.commands = Some(commands);
        true
    }

    pub fn command_count(&self) -> usize {
        self.commands.as_ref().map_or(0, Vec::len)
    }
}

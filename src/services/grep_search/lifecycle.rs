//! Grep Search Invocation Lifecycle
//!
//! Drives one streamed tool call through start, delta and finish:
//! - start publishes an empty progress entry (`append`)
//! - each delta re-parses the accumulated arguments and publishes (`append`)
//!   only when a new non-empty `commands` list becomes decodable
//! - finish replaces the optimistic guess with the final arguments and
//!   publishes the completed entry (`update`)
//!
//! Sink failures never interrupt the stream: they are logged and dropped, and
//! the finish publish carries the final truth.

use std::sync::Arc;

use async_trait::async_trait;
use toolstream_core::CoreResult;

use super::state::{LifecyclePhase, ToolInvocationState};
use super::transform::{build_progress_entry, build_transcript_entry};
use super::GrepSearchInput;
use crate::models::{EntryStatus, UpdateMode};
use crate::services::persistence::MessageSink;
use crate::services::router::ToolStreamHandler;

/// One in-flight grep search call.
pub struct GrepSearchInvocation {
    message_id: String,
    tool_name: String,
    sink: Arc<dyn MessageSink>,
    state: ToolInvocationState,
    phase: LifecyclePhase,
}

impl GrepSearchInvocation {
    pub fn new(
        message_id: impl Into<String>,
        tool_name: impl Into<String>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            tool_name: tool_name.into(),
            sink,
            state: ToolInvocationState::new(),
            phase: LifecyclePhase::NotStarted,
        }
    }

    pub fn state(&self) -> &ToolInvocationState {
        &self.state
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub async fn on_invocation_start(&mut self, invocation_id: &str) {
        if self.reject_if_finished("start", invocation_id) {
            return;
        }
        self.state.ensure_entry_id(invocation_id);
        self.phase = LifecyclePhase::Started;
        self.publish(invocation_id, EntryStatus::Loading, UpdateMode::Append)
            .await;
    }

    pub async fn on_invocation_delta(&mut self, fragment: &str, invocation_id: &str) {
        if self.reject_if_finished("delta", invocation_id) {
            return;
        }
        self.phase = LifecyclePhase::Streaming;
        self.state.push_fragment(fragment);

        let Some(commands) = self.state.extract_commands() else {
            return;
        };
        if !self.state.apply_extracted(commands) {
            return;
        }
        tracing::debug!(
            "[GrepSearch] Extracted {} command(s) for {}",
            self.state.command_count(),
            invocation_id
        );
        self.publish(invocation_id, EntryStatus::Loading, UpdateMode::Append)
            .await;
    }

    pub async fn on_invocation_finish(&mut self, final_args: GrepSearchInput, invocation_id: &str) {
        if self.reject_if_finished("finish", invocation_id) {
            return;
        }
        self.state.ensure_entry_id(invocation_id);
        self.state.commands = Some(final_args.commands);
        self.phase = LifecyclePhase::Finished;
        self.publish(invocation_id, EntryStatus::Completed, UpdateMode::Update)
            .await;
    }

    fn reject_if_finished(&self, event: &str, invocation_id: &str) -> bool {
        if self.phase.is_finished() {
            tracing::warn!(
                "[GrepSearch] Ignoring {} for finished invocation {}",
                event,
                invocation_id
            );
            return true;
        }
        false
    }

    async fn publish(&self, invocation_id: &str, status: EntryStatus, mode: UpdateMode) {
        let entry = build_progress_entry(&self.state, invocation_id, status);
        let transcript = build_transcript_entry(&self.state, invocation_id, &self.tool_name);
        let (Some(entry), Some(transcript)) = (entry, transcript) else {
            tracing::warn!("[GrepSearch] No entry id for invocation, skipping {}", mode);
            return;
        };

        tracing::debug!(
            "[GrepSearch] Publishing {} for {}: {}",
            mode,
            entry.id,
            entry.message
        );
        if let Err(e) = self
            .sink
            .update_message_entries(&self.message_id, &entry, &transcript, mode)
            .await
        {
            tracing::warn!(
                "[GrepSearch] Failed to persist {} for {}: {}",
                mode,
                entry.id,
                e
            );
        }
    }
}

#[async_trait]
impl ToolStreamHandler for GrepSearchInvocation {
    async fn on_start(&mut self, invocation_id: &str) {
        self.on_invocation_start(invocation_id).await;
    }

    async fn on_delta(&mut self, fragment: &str, invocation_id: &str) {
        self.on_invocation_delta(fragment, invocation_id).await;
    }

    async fn on_finish(&mut self, arguments: &str, invocation_id: &str) -> CoreResult<()> {
        let input = GrepSearchInput::from_arguments(arguments)?;
        self.on_invocation_finish(input, invocation_id).await;
        Ok(())
    }

    fn phase(&self) -> LifecyclePhase {
        self.phase
    }
}

//! Message Persistence
//!
//! The narrow sink tool invocations publish their entries to. The host
//! application owns storage; this module only defines the seam plus two
//! implementations:
//! - `InMemoryMessageSink` - records every call and keeps entries keyed by id
//! - `ChannelMessageSink` - forwards each publish over a tokio mpsc channel

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use toolstream_core::{CoreError, CoreResult};

use crate::models::{RawLlmMessage, ResponseEntry, UpdateMode};

/// Persistence seam for tool invocation entries.
///
/// `Append` adds the entry; `Update` replaces the entry with the same id.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn update_message_entries(
        &self,
        message_id: &str,
        response_entry: &ResponseEntry,
        raw_llm_message: &RawLlmMessage,
        mode: UpdateMode,
    ) -> CoreResult<()>;
}

/// One publish, as seen by a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    pub message_id: String,
    pub response_entry: ResponseEntry,
    pub raw_llm_message: RawLlmMessage,
    pub mode: UpdateMode,
}

// ============================================================================
// In-memory sink
// ============================================================================

#[derive(Debug, Default)]
struct MessageRecord {
    entries: Vec<ResponseEntry>,
    transcript: Vec<RawLlmMessage>,
}

#[derive(Debug, Default)]
struct SinkInner {
    calls: Vec<EntryUpdate>,
    messages: HashMap<String, MessageRecord>,
    failures_remaining: usize,
}

/// Sink keeping everything in memory.
///
/// Entries are upserted by id in both modes, so a repeated `Append` for the
/// same invocation replaces its earlier entry instead of duplicating it. This
/// differs from a strict append sink, which would keep one entry per `Append`
/// call; use `calls()` to see every publish as it was made.
#[derive(Debug, Default)]
pub struct InMemoryMessageSink {
    inner: Mutex<SinkInner>,
}

impl InMemoryMessageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` calls with a persistence error.
    /// Rejected calls are still recorded.
    pub fn fail_next(&self, count: usize) {
        self.lock().failures_remaining = count;
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<EntryUpdate> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Current response entries of a message.
    pub fn entries(&self, message_id: &str) -> Vec<ResponseEntry> {
        self.lock()
            .messages
            .get(message_id)
            .map(|record| record.entries.clone())
            .unwrap_or_default()
    }

    /// Current transcript messages of a message.
    pub fn transcript(&self, message_id: &str) -> Vec<RawLlmMessage> {
        self.lock()
            .messages
            .get(message_id)
            .map(|record| record.transcript.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn upsert_entry(entries: &mut Vec<ResponseEntry>, entry: &ResponseEntry) {
    match entries.iter_mut().find(|e| e.id == entry.id) {
        Some(existing) => *existing = entry.clone(),
        None => entries.push(entry.clone()),
    }
}

fn upsert_transcript(transcript: &mut Vec<RawLlmMessage>, message: &RawLlmMessage) {
    let call_id = message.first_tool_call().map(|c| c.tool_call_id.as_str());
    let existing = call_id.and_then(|id| {
        transcript
            .iter_mut()
            .find(|m| m.first_tool_call().map(|c| c.tool_call_id.as_str()) == Some(id))
    });
    match existing {
        Some(slot) => *slot = message.clone(),
        None => transcript.push(message.clone()),
    }
}

#[async_trait]
impl MessageSink for InMemoryMessageSink {
    async fn update_message_entries(
        &self,
        message_id: &str,
        response_entry: &ResponseEntry,
        raw_llm_message: &RawLlmMessage,
        mode: UpdateMode,
    ) -> CoreResult<()> {
        let mut inner = self.lock();
        inner.calls.push(EntryUpdate {
            message_id: message_id.to_string(),
            response_entry: response_entry.clone(),
            raw_llm_message: raw_llm_message.clone(),
            mode,
        });

        if inner.failures_remaining > 0 {
            inner.failures_remaining -= 1;
            return Err(CoreError::persistence(format!(
                "Sink rejected {} for entry {}",
                mode, response_entry.id
            )));
        }

        let record = inner.messages.entry(message_id.to_string()).or_default();
        upsert_entry(&mut record.entries, response_entry);
        upsert_transcript(&mut record.transcript, raw_llm_message);
        Ok(())
    }
}

// ============================================================================
// Channel sink
// ============================================================================

/// Sink forwarding every publish to a receiver task.
#[derive(Debug, Clone)]
pub struct ChannelMessageSink {
    tx: mpsc::Sender<EntryUpdate>,
}

impl ChannelMessageSink {
    pub fn new(tx: mpsc::Sender<EntryUpdate>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<EntryUpdate>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl MessageSink for ChannelMessageSink {
    async fn update_message_entries(
        &self,
        message_id: &str,
        response_entry: &ResponseEntry,
        raw_llm_message: &RawLlmMessage,
        mode: UpdateMode,
    ) -> CoreResult<()> {
        let update = EntryUpdate {
            message_id: message_id.to_string(),
            response_entry: response_entry.clone(),
            raw_llm_message: raw_llm_message.clone(),
            mode,
        };
        self.tx
            .send(update)
            .await
            .map_err(|e| CoreError::persistence(format!("Entry channel closed: {}", e)))
    }
}

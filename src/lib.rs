//! Toolstream
//!
//! Incremental tool-call argument reconciliation for streaming LLM agents.
//! As a model streams a tool call, the arguments are parsed optimistically,
//! progress and transcript entries are published to a message sink, and the
//! finalized commands are executed against an injected sandbox executor.
//!
//! It includes:
//! - Data models for published entries and configuration
//! - The grep search lifecycle, tool, and stream router
//! - Message sinks (in-memory and channel-backed)
//!
//! Parsing and error types live in `toolstream-core`; command execution lives
//! in `toolstream-tools`.

pub mod models;
pub mod services;

pub use models::{
    ContentPart, EntryStatus, MessageRole, RawLlmMessage, ResponseEntry, ToolCallPart,
    ToolstreamConfig, ToolstreamConfigBuilder, UpdateMode,
};
pub use services::grep_search::{register_stream_handler, LifecyclePhase};
pub use services::{
    ChannelMessageSink, CompletedToolCall, EntryUpdate, GrepSearchInput, GrepSearchInvocation,
    GrepSearchTool, InMemoryMessageSink, MessageSink, ToolInvocationState, ToolStreamHandler,
    ToolStreamRegistry, ToolStreamRouter,
};
pub use toolstream_core::{CoreError, CoreResult, UnifiedStreamEvent};

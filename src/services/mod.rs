//! Services
//!
//! Streaming reconciliation services:
//! - `grep_search` - lifecycle, transforms and execution of the grep search tool
//! - `persistence` - the message sink seam and its implementations
//! - `router` - dispatch of unified stream events to tool lifecycles

pub mod grep_search;
pub mod persistence;
pub mod router;

pub use grep_search::{GrepSearchInput, GrepSearchInvocation, GrepSearchTool, ToolInvocationState};
pub use persistence::{ChannelMessageSink, EntryUpdate, InMemoryMessageSink, MessageSink};
pub use router::{CompletedToolCall, ToolStreamHandler, ToolStreamRegistry, ToolStreamRouter};

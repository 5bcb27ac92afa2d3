//! Data Models
//!
//! Serializable shapes shared by services: published message entries and
//! configuration.

pub mod message;
pub mod settings;

pub use message::{
    ContentPart, EntryStatus, MessageRole, RawLlmMessage, ResponseEntry, ToolCallPart, UpdateMode,
};
pub use settings::{ToolstreamConfig, ToolstreamConfigBuilder, DEFAULT_TOOL_NAME};

//! Toolstream Core
//!
//! Foundational types for the Toolstream workspace. This crate has no
//! dependency on async runtimes, persistence, or command execution.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `partial_json` - Optimistic parsing of partially streamed JSON objects
//! - `streaming` - Unified stream event types
//! - `context` - Per-call tool execution context
//! - `tool_trait` - Tool abstraction (`ToolDefinitionTrait`, `ToolExecutable`, `UnifiedToolRegistry`)

pub mod context;
pub mod error;
pub mod partial_json;
pub mod streaming;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Optimistic Parsing ─────────────────────────────────────────────────
pub use partial_json::{get_optimistic_as, get_optimistic_value, parse_optimistic, ParseResult};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::UnifiedStreamEvent;

// ── Tools ──────────────────────────────────────────────────────────────
pub use context::ToolContext;
pub use tool_trait::{
    ToolDefinitionTrait, ToolExecutable, ToolSchema, UnifiedTool, UnifiedToolRegistry,
};

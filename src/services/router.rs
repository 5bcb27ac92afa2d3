//! Tool Stream Router
//!
//! Dispatches unified stream events to per-invocation lifecycle handlers.
//! Tool names map to handler factories in a `ToolStreamRegistry`; the router
//! keeps the in-flight handlers keyed by tool call id and drops each one once
//! its call completes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use toolstream_core::{CoreResult, ToolContext, UnifiedStreamEvent, UnifiedToolRegistry};

use crate::services::grep_search::LifecyclePhase;

/// Lifecycle callbacks of one streamed tool call.
///
/// Callbacks for one invocation are delivered serially.
#[async_trait]
pub trait ToolStreamHandler: Send {
    async fn on_start(&mut self, invocation_id: &str);

    async fn on_delta(&mut self, fragment: &str, invocation_id: &str);

    /// Validate the complete arguments and publish the final state.
    async fn on_finish(&mut self, arguments: &str, invocation_id: &str) -> CoreResult<()>;

    fn phase(&self) -> LifecyclePhase;
}

/// Creates a handler for one invocation, given the owning message id.
pub type HandlerFactory = Arc<dyn Fn(&str) -> Box<dyn ToolStreamHandler> + Send + Sync>;

/// Tool name to handler factory mapping.
#[derive(Default)]
pub struct ToolStreamRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl ToolStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. Replaces any existing factory for the same tool.
    pub fn register<F>(&mut self, tool_name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Box<dyn ToolStreamHandler> + Send + Sync + 'static,
    {
        self.factories.insert(tool_name.into(), Arc::new(factory));
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.factories.contains_key(tool_name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// New handler for `tool_name`, if one is registered.
    pub fn create(&self, tool_name: &str, message_id: &str) -> Option<Box<dyn ToolStreamHandler>> {
        self.factories.get(tool_name).map(|factory| factory(message_id))
    }
}

/// A tool call whose final arguments passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedToolCall {
    pub tool_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

struct ActiveInvocation {
    tool_name: String,
    handler: Box<dyn ToolStreamHandler>,
}

/// Routes the tool events of one assistant message.
pub struct ToolStreamRouter {
    message_id: String,
    registry: Arc<ToolStreamRegistry>,
    active: HashMap<String, ActiveInvocation>,
}

impl ToolStreamRouter {
    pub fn new(message_id: impl Into<String>, registry: Arc<ToolStreamRegistry>) -> Self {
        Self {
            message_id: message_id.into(),
            registry,
            active: HashMap::new(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Number of invocations started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, tool_id: &str) -> bool {
        self.active.contains_key(tool_id)
    }

    /// Lifecycle phase of an in-flight call.
    pub fn phase_of(&self, tool_id: &str) -> Option<LifecyclePhase> {
        self.active.get(tool_id).map(|active| active.handler.phase())
    }

    /// Handle one stream event.
    ///
    /// Returns the validated call when a tracked tool call completes. Invalid
    /// final arguments are returned as an error; the invocation is dropped
    /// either way.
    pub async fn handle_event(
        &mut self,
        event: &UnifiedStreamEvent,
    ) -> CoreResult<Option<CompletedToolCall>> {
        match event {
            UnifiedStreamEvent::ToolStart { tool_id, tool_name } => {
                self.start(tool_id, tool_name).await;
                Ok(None)
            }
            UnifiedStreamEvent::ToolDelta { tool_id, delta } => {
                match self.active.get_mut(tool_id) {
                    Some(active) => active.handler.on_delta(delta, tool_id).await,
                    None => tracing::debug!("[ToolRouter] Ignoring delta for untracked call {}", tool_id),
                }
                Ok(None)
            }
            UnifiedStreamEvent::ToolComplete {
                tool_id,
                tool_name,
                arguments,
            } => self.complete(tool_id, tool_name, arguments).await,
            UnifiedStreamEvent::Complete { .. } => {
                if !self.active.is_empty() {
                    tracing::warn!(
                        "[ToolRouter] Stream completed with {} unfinished tool call(s) in {}",
                        self.active.len(),
                        self.message_id
                    );
                    self.active.clear();
                }
                Ok(None)
            }
            UnifiedStreamEvent::Error { message, code } => {
                tracing::warn!(
                    "[ToolRouter] Stream error in {} ({}): {}; dropping {} unfinished tool call(s)",
                    self.message_id,
                    code.as_deref().unwrap_or("no code"),
                    message,
                    self.active.len()
                );
                self.active.clear();
                Ok(None)
            }
            UnifiedStreamEvent::TextDelta { .. } => Ok(None),
        }
    }

    /// Run a completed call through the tool registered under its name.
    pub async fn execute_completed(
        &self,
        tools: &UnifiedToolRegistry,
        call: &CompletedToolCall,
    ) -> CoreResult<Value> {
        tracing::debug!(
            "[ToolRouter] Executing {} for call {} in {}",
            call.tool_name,
            call.tool_id,
            self.message_id
        );
        let ctx = ToolContext::new(&self.message_id, &call.tool_id);
        tools
            .dispatch(&call.tool_name, &ctx, call.arguments.clone())
            .await
    }

    /// Consume events until the channel closes. Returns the completed calls
    /// in completion order.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<UnifiedStreamEvent>) -> Vec<CompletedToolCall> {
        let mut completed = Vec::new();
        while let Some(event) = rx.recv().await {
            match self.handle_event(&event).await {
                Ok(Some(call)) => completed.push(call),
                Ok(None) => {}
                Err(e) => tracing::warn!("[ToolRouter] Rejected tool call: {}", e),
            }
        }
        completed
    }

    async fn start(&mut self, tool_id: &str, tool_name: &str) {
        if self.active.contains_key(tool_id) {
            tracing::warn!("[ToolRouter] Duplicate start for {}, ignoring", tool_id);
            return;
        }
        let Some(mut handler) = self.registry.create(tool_name, &self.message_id) else {
            tracing::debug!("[ToolRouter] No stream handler for tool {}", tool_name);
            return;
        };
        handler.on_start(tool_id).await;
        self.active.insert(
            tool_id.to_string(),
            ActiveInvocation {
                tool_name: tool_name.to_string(),
                handler,
            },
        );
    }

    async fn complete(
        &mut self,
        tool_id: &str,
        tool_name: &str,
        arguments: &str,
    ) -> CoreResult<Option<CompletedToolCall>> {
        let active = match self.active.remove(tool_id) {
            Some(active) => Some(active),
            // A provider may deliver a call only once it is complete.
            None => self
                .registry
                .create(tool_name, &self.message_id)
                .map(|handler| ActiveInvocation {
                    tool_name: tool_name.to_string(),
                    handler,
                }),
        };
        let Some(mut active) = active else {
            tracing::debug!("[ToolRouter] No stream handler for tool {}", tool_name);
            return Ok(None);
        };
        if active.tool_name != tool_name {
            tracing::warn!(
                "[ToolRouter] Call {} started as {} but completed as {}",
                tool_id,
                active.tool_name,
                tool_name
            );
        }

        active.handler.on_finish(arguments, tool_id).await?;
        Ok(Some(CompletedToolCall {
            tool_id: tool_id.to_string(),
            tool_name: active.tool_name,
            arguments: serde_json::from_str(arguments)?,
        }))
    }
}

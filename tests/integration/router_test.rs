//! Router Integration Tests
//!
//! Streams unified events through a channel into the router, with the grep
//! search handler publishing to a channel sink, then executes the completed
//! calls through the tool registry.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use toolstream::{
    register_stream_handler, ChannelMessageSink, EntryStatus, GrepSearchTool, InMemoryMessageSink,
    ToolStreamRegistry, ToolStreamRouter, UnifiedStreamEvent, UpdateMode,
};
use toolstream_core::{CoreError, CoreResult, UnifiedToolRegistry};
use toolstream_tools::{CommandExecutor, CommandOutput, ExecutionSummary};

struct EchoExecutor;

#[async_trait]
impl CommandExecutor for EchoExecutor {
    async fn execute_command(&self, command: &str) -> CoreResult<CommandOutput> {
        Ok(CommandOutput::new(format!("ran {}\n", command), 0))
    }
}

fn registry_with(sink: Arc<dyn toolstream::MessageSink>) -> Arc<ToolStreamRegistry> {
    let mut registry = ToolStreamRegistry::new();
    register_stream_handler(&mut registry, "grepSearch", sink);
    Arc::new(registry)
}

fn start(id: &str) -> UnifiedStreamEvent {
    UnifiedStreamEvent::ToolStart {
        tool_id: id.to_string(),
        tool_name: "grepSearch".to_string(),
    }
}

fn delta(id: &str, text: &str) -> UnifiedStreamEvent {
    UnifiedStreamEvent::ToolDelta {
        tool_id: id.to_string(),
        delta: text.to_string(),
    }
}

fn complete(id: &str, arguments: &str) -> UnifiedStreamEvent {
    UnifiedStreamEvent::ToolComplete {
        tool_id: id.to_string(),
        tool_name: "grepSearch".to_string(),
        arguments: arguments.to_string(),
    }
}

#[tokio::test]
async fn test_stream_to_channel_sink_and_execution() {
    let (sink, mut updates) = ChannelMessageSink::channel(32);
    let mut router = ToolStreamRouter::new("msg_7", registry_with(Arc::new(sink)));

    let (tx, rx) = mpsc::channel(32);
    let events = vec![
        UnifiedStreamEvent::TextDelta {
            content: "Let me search.".to_string(),
        },
        start("call_1"),
        delta("call_1", r#"{"commands": ["rg \"test\" file.txt""#),
        delta("call_1", r#", "rg -i \"hello\" *.js"]}"#),
        complete(
            "call_1",
            r#"{"commands": ["rg \"test\" file.txt", "rg -i \"hello\" *.js"]}"#,
        ),
        UnifiedStreamEvent::Complete {
            stop_reason: Some("tool_use".to_string()),
        },
    ];
    for event in events {
        tx.send(event).await.unwrap();
    }
    drop(tx);

    let completed = router.run(rx).await;

    let mut received = Vec::new();
    while let Ok(update) = updates.try_recv() {
        received.push(update);
    }
    let modes: Vec<UpdateMode> = received.iter().map(|u| u.mode).collect();
    assert_eq!(
        modes,
        vec![UpdateMode::Append, UpdateMode::Append, UpdateMode::Update]
    );
    assert!(received.iter().all(|u| u.message_id == "msg_7"));
    assert!(received.iter().all(|u| u.response_entry.id == "call_1"));
    assert_eq!(received[0].response_entry.message, "Preparing search commands...");
    assert_eq!(received[1].response_entry.message, "Running 2 searches...");
    assert_eq!(received[2].response_entry.status, EntryStatus::Completed);

    assert_eq!(completed.len(), 1);
    let mut tools = UnifiedToolRegistry::new();
    tools.register(Arc::new(GrepSearchTool::new(Some(Arc::new(EchoExecutor)))));
    let call = &completed[0];
    let value = router.execute_completed(&tools, call).await.unwrap();
    let summary: ExecutionSummary = serde_json::from_value(value).unwrap();
    assert_eq!(
        summary.results[1].stdout.as_deref(),
        Some(r#"ran rg -i "hello" *.js"#)
    );
}

#[tokio::test]
async fn test_interleaved_calls_are_tracked_separately() {
    let sink = Arc::new(InMemoryMessageSink::new());
    let mut router = ToolStreamRouter::new("msg_8", registry_with(sink.clone()));

    for event in [
        start("a"),
        start("b"),
        delta("b", r#"{"commands": ["rg b1"]"#),
        delta("a", r#"{"commands": ["rg a1", "rg a2"]"#),
    ] {
        router.handle_event(&event).await.unwrap();
    }
    assert_eq!(router.in_flight(), 2);

    router
        .handle_event(&complete("b", r#"{"commands": ["rg b1"]}"#))
        .await
        .unwrap();
    assert!(!router.is_active("b"));
    assert!(router.is_active("a"));

    let entries = sink.entries("msg_8");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "a");
    assert_eq!(entries[0].message, "Running 2 searches...");
    assert_eq!(entries[0].status, EntryStatus::Loading);
    assert_eq!(entries[1].status, EntryStatus::Completed);
}

#[tokio::test]
async fn test_invalid_final_arguments_surface_as_validation_error() {
    let sink = Arc::new(InMemoryMessageSink::new());
    let mut router = ToolStreamRouter::new("msg_9", registry_with(sink.clone()));

    router.handle_event(&start("c")).await.unwrap();
    let err = router
        .handle_event(&complete("c", r#"{"commands": [""]}"#))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(router.in_flight(), 0);
    // Only the start publish happened.
    assert_eq!(sink.call_count(), 1);
}

//! Integration Tests Module
//!
//! End-to-end coverage of the reconciliation layer: streamed lifecycles
//! publishing to sinks, batch execution, event routing, and configuration.


// Concurrent command execution through the grep search tool
mod execution_test;

// Stream event routing from channel to sink and execution
mod router_test;

// Config loading and wiring
mod config_test;

//! Toolstream Tools
//!
//! Command execution for command-style tools:
//! - `CommandExecutor` - injected capability that runs one command (sandbox)
//! - `SuccessPolicy` - per-tool exit code interpretation
//! - `execute_commands` - concurrent, order-preserving batch execution
//! - `LocalShellExecutor` - host shell implementation of `CommandExecutor`
//!
//! Streaming reconciliation and persistence live in the main crate.

pub mod executor;
pub mod local_shell;

pub use executor::{
    execute_commands, CommandExecutor, CommandOutput, CommandResult, ExecutionSummary,
    SearchSuccessPolicy, StrictExitCode, SuccessPolicy, DEFAULT_SEARCH_PROGRAMS,
    NO_COMMANDS_MESSAGE, SANDBOX_REQUIRED_ERROR,
};
pub use local_shell::LocalShellExecutor;

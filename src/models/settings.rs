//! Settings Models
//!
//! Configuration for the reconciliation layer: which tool name the grep search
//! handler answers to, which programs count as pattern searches, and how the
//! local shell executor runs commands.
//!
//! Settings can be loaded from TOML or assembled with `ToolstreamConfigBuilder`,
//! which validates at `build()` time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolstream_core::{CoreError, CoreResult};
use toolstream_tools::{LocalShellExecutor, SearchSuccessPolicy, DEFAULT_SEARCH_PROGRAMS};

/// Default tool name of the grep search tool.
pub const DEFAULT_TOOL_NAME: &str = "grepSearch";

/// Reconciliation layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolstreamConfig {
    /// Tool name the grep search handler is registered under
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    /// Programs whose exit code 1 means "no matches"
    #[serde(default = "default_search_programs")]
    pub search_programs: Vec<String>,
    /// Shell used by the local executor
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Per-command timeout for the local executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
    /// Working directory for the local executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_tool_name() -> String {
    DEFAULT_TOOL_NAME.to_string()
}

fn default_search_programs() -> Vec<String> {
    DEFAULT_SEARCH_PROGRAMS.iter().map(|p| p.to_string()).collect()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for ToolstreamConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            search_programs: default_search_programs(),
            shell: default_shell(),
            command_timeout_secs: None,
            working_dir: None,
        }
    }
}

impl ToolstreamConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CoreError::config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.tool_name.trim().is_empty() {
            return Err(CoreError::config("tool_name cannot be empty"));
        }
        if self.search_programs.is_empty() {
            return Err(CoreError::config("search_programs must list at least one program"));
        }
        if self.search_programs.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::config("search_programs cannot contain blank entries"));
        }
        if self.shell.trim().is_empty() {
            return Err(CoreError::config("shell cannot be empty"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(CoreError::config("command_timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Exit code policy for the configured search programs.
    pub fn search_policy(&self) -> SearchSuccessPolicy {
        SearchSuccessPolicy::new(self.search_programs.iter().cloned())
    }

    /// Local shell executor configured from these settings.
    pub fn local_executor(&self) -> LocalShellExecutor {
        let mut executor = LocalShellExecutor::new().with_shell(self.shell.clone());
        if let Some(secs) = self.command_timeout_secs {
            executor = executor.with_timeout(Duration::from_secs(secs));
        }
        if let Some(dir) = &self.working_dir {
            executor = executor.with_working_dir(dir.clone());
        }
        executor
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for `ToolstreamConfig`.
#[derive(Debug, Clone, Default)]
pub struct ToolstreamConfigBuilder {
    tool_name: Option<String>,
    search_programs: Option<Vec<String>>,
    shell: Option<String>,
    command_timeout_secs: Option<u64>,
    working_dir: Option<PathBuf>,
}

impl ToolstreamConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    pub fn search_programs<I, S>(mut self, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_programs = Some(programs.into_iter().map(Into::into).collect());
        self
    }

    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.command_timeout_secs = Some(secs);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Validate and build the config.
    pub fn build(self) -> CoreResult<ToolstreamConfig> {
        let defaults = ToolstreamConfig::default();
        let config = ToolstreamConfig {
            tool_name: self.tool_name.unwrap_or(defaults.tool_name),
            search_programs: self.search_programs.unwrap_or(defaults.search_programs),
            shell: self.shell.unwrap_or(defaults.shell),
            command_timeout_secs: self.command_timeout_secs,
            working_dir: self.working_dir,
        };
        config.validate()?;
        Ok(config)
    }
}

//! Configuration model for foreman.
//!
//! Retry counts, backoff curves, and timeout durations are deliberately
//! configuration rather than constants baked into the engine or the
//! breakpoint controller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure for foreman.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Run directory storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Agent backend configurations
    #[serde(default)]
    pub backends: BackendsConfig,
}

/// Run directory storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Root directory run directories are created under
    #[serde(default = "default_storage_root")]
    pub root: String,
}

fn default_storage_root() -> String {
    ".foreman/runs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rotated file output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum total invocation attempts when the agent response fails schema
    /// validation (the violations are fed back each time)
    #[serde(default = "default_validation_attempts")]
    pub validation_attempts: u32,

    /// Maximum additional attempts after a transient backend failure
    #[serde(default = "default_transient_retries")]
    pub transient_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_validation_attempts() -> u32 {
    2
}

const fn default_transient_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    10_000
}

const fn default_max_backoff_ms() -> u64 {
    300_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            validation_attempts: default_validation_attempts(),
            transient_retries: default_transient_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Per-attempt agent invocation timeout in seconds
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,

    /// Breakpoint decision timeout in seconds. Human-timescale: a reviewer
    /// may take hours.
    #[serde(default = "default_breakpoint_timeout_secs")]
    pub breakpoint_timeout_secs: u64,

    /// Poll interval for file-based decision sources, in milliseconds
    #[serde(default = "default_decision_poll_ms")]
    pub decision_poll_ms: u64,
}

const fn default_invoke_timeout_secs() -> u64 {
    300
}

const fn default_breakpoint_timeout_secs() -> u64 {
    86_400
}

const fn default_decision_poll_ms() -> u64 {
    500
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            invoke_timeout_secs: default_invoke_timeout_secs(),
            breakpoint_timeout_secs: default_breakpoint_timeout_secs(),
            decision_poll_ms: default_decision_poll_ms(),
        }
    }
}

/// Agent backends configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendsConfig {
    /// Default backend when an agent has no mapping
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Enabled backend types
    #[serde(default = "default_enabled_backends")]
    pub enabled: Vec<String>,

    /// Command backend configuration
    #[serde(default)]
    pub command: CommandBackendConfig,

    /// HTTP backend configuration
    #[serde(default)]
    pub http: HttpBackendConfig,

    /// Agent name to backend mappings
    #[serde(default)]
    pub agent_mappings: HashMap<String, String>,
}

fn default_backend() -> String {
    "command".to_string()
}

fn default_enabled_backends() -> Vec<String> {
    vec!["command".to_string(), "mock".to_string()]
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            default_backend: default_backend(),
            enabled: default_enabled_backends(),
            command: CommandBackendConfig::default(),
            http: HttpBackendConfig::default(),
            agent_mappings: HashMap::new(),
        }
    }
}

/// Command backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandBackendConfig {
    /// Executable invoked per task
    #[serde(default = "default_command_program")]
    pub program: String,

    /// Arguments passed before the prompt is piped on stdin
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the spawned process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Environment variables for the spawned process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_command_program() -> String {
    "agent".to_string()
}

impl Default for CommandBackendConfig {
    fn default() -> Self {
        Self {
            program: default_command_program(),
            args: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
        }
    }
}

/// HTTP backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpBackendConfig {
    /// Endpoint invocation payloads are POSTed to
    #[serde(default = "default_http_endpoint")]
    pub endpoint: String,

    /// Bearer token (can also come from FOREMAN_BACKENDS__HTTP__TOKEN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_http_endpoint() -> String {
    "http://localhost:8700/invoke".to_string()
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_http_endpoint(),
            token: None,
        }
    }
}

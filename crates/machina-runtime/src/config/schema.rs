//! Configuration schema for the Machina runtime.
//!
//! The schema is deliberately small: the bot's identity, how to log, and a
//! free-form `settings` table that is flattened into dotted keys and handed
//! to plugins untouched.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use machina_core::Settings;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachinaConfig {
    /// Identity the mention grammar is built from.
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Free-form plugin settings. Nested tables become dotted keys, so
    /// `[settings.greeting] language = "en"` is read as `greeting.language`.
    #[serde(default)]
    pub settings: serde_json::Map<String, Value>,
}

impl MachinaConfig {
    /// Flattens the `settings` table into the dotted-key form plugins read.
    pub fn plugin_settings(&self) -> Settings {
        let mut settings = Settings::new();
        for (key, value) in &self.settings {
            flatten_value(&mut settings, key, value);
        }
        settings
    }
}

fn flatten_value(settings: &mut Settings, prefix: &str, value: &Value) {
    match value {
        Value::Object(table) => {
            for (key, nested) in table {
                flatten_value(settings, &format!("{prefix}.{key}"), nested);
            }
        }
        leaf => settings.set(prefix, leaf.clone()),
    }
}

/// Identity of the bot inside the chat workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// User id the chat backend assigned to the bot (e.g. `U012AB3CD`).
    #[serde(default = "default_bot_user_id")]
    pub user_id: String,

    /// Username the bot is registered under.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Additional names the bot answers to in channels.
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_bot_user_id() -> String {
    "B1".to_string()
}

fn default_bot_name() -> String {
    "machina".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_id: default_bot_user_id(),
            name: default_bot_name(),
            aliases: Vec::new(),
        }
    }
}

/// Log verbosity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the lowercase name used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the corresponding `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log line rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line output with abbreviated metadata.
    #[default]
    Compact,
    /// The default `tracing_subscriber` format.
    Full,
    /// Multi-line human-oriented output.
    Pretty,
    /// Structured JSON lines. Requires the `json-log` feature; without it
    /// the runtime falls back to `Compact`.
    Json,
}

/// Where log output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    /// Log when a span is created.
    pub new: bool,
    /// Log when a span is entered.
    pub enter: bool,
    /// Log when a span is exited.
    pub exit: bool,
    /// Log when a span is closed.
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Span lifecycle events to include.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Log file path, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `machina_engine = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

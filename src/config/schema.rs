//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the variable engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Registry sizing and recursion budget.
    pub variables: VariablesConfig,

    /// Per-request arena settings.
    pub arena: ArenaConfig,

    /// Server-level values exposed as variables.
    pub server: ServerConfig,

    /// Map variables, in definition order.
    pub maps: Vec<MapConfig>,

    /// Named log format templates.
    pub log_formats: Vec<LogFormatConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Variable registry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VariablesConfig {
    /// Upper bound on the by-name table's bucket count.
    pub hash_max_size: usize,

    /// Byte budget per bucket.
    pub hash_bucket_size: usize,

    /// Nested evaluation budget.
    pub max_depth: usize,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self {
            hash_max_size: 1024,
            hash_bucket_size: 64,
            max_depth: 100,
        }
    }
}

/// Request arena settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Size of each arena chunk in bytes.
    pub chunk_size: usize,

    /// Optional cap on bytes allocated per request.
    pub limit_bytes: Option<usize>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            limit_bytes: None,
        }
    }
}

/// Server values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Primary server name.
    pub server_name: String,

    /// Document root.
    pub root: String,

    /// Hostname override; the machine hostname when empty.
    pub hostname: String,

    /// Keepalive timeout advertised to clients (0 = no Keep-Alive header).
    pub keepalive_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            root: "html".to_string(),
            hostname: String::new(),
            keepalive_timeout_secs: 75,
        }
    }
}

/// A map variable.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MapConfig {
    /// Variable to define, with or without `$`.
    pub variable: String,

    /// Template evaluated to produce the lookup subject (e.g. `"$http_host"`).
    pub source: String,

    /// Value when no key matches; empty when unset.
    pub default: Option<String>,

    /// Enable `*.example.com`, `.example.com` and `www.example.*` keys.
    pub hostnames: bool,

    /// Recompute on every read instead of once per request.
    pub volatile: bool,

    /// Keys in definition order; `~` / `~*` prefixes mark regexes.
    pub entries: Vec<MapEntry>,
}

/// One map key and its value template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub value: String,
}

/// A named log format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogFormatConfig {
    pub name: String,
    pub format: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

//! Engine facade.
//!
//! # Responsibilities
//! - Turn an `EngineConfig` into a finalized variable table
//! - Own the compiled log formats and the shared server context
//! - Hand out requests sized for this configuration
//!
//! # Data Flow
//! ```text
//! EngineConfig
//!     → add_core_variables (built-ins, prefixes)
//!     → define_map (one per [[maps]])
//!     → Template::compile (one per [[log_formats]])
//!     → VariablesBuilder::finalize
//!     → Engine (immutable, shared behind Arc)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::request::Parts;

use crate::builtins::add_core_variables;
use crate::config::{ArenaConfig, EngineConfig};
use crate::hash::HashSizing;
use crate::http::{ingest, Arena, ConnectionInfo, Request, ServerInfo};
use crate::map::define_map;
use crate::net::connection::ConnectionTracker;
use crate::template::Template;
use crate::variables::{ConfigError, Variables, VariablesBuilder};

/// Placeholder written by log formats for unresolved variables.
pub const LOG_MISSING: &[u8] = b"-";

/// One finalized configuration.
pub struct Engine {
    variables: Variables,
    log_formats: HashMap<String, Template>,
    server: Arc<ServerInfo>,
    arena: ArenaConfig,
}

impl Engine {
    /// Build an engine with fresh connection counters.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_tracker(config, ConnectionTracker::new())
    }

    /// Build an engine that reports into an existing set of connection counters.
    pub fn with_tracker(
        config: &EngineConfig,
        tracker: ConnectionTracker,
    ) -> Result<Self, ConfigError> {
        let sizing = HashSizing {
            max_size: config.variables.hash_max_size,
            bucket_size: config.variables.hash_bucket_size,
        };
        let mut builder = VariablesBuilder::new(sizing, config.variables.max_depth);

        add_core_variables(&mut builder)?;

        for map in &config.maps {
            define_map(&mut builder, map, sizing)?;
        }

        let mut log_formats = HashMap::with_capacity(config.log_formats.len());
        for format in &config.log_formats {
            let template = Template::compile(&mut builder, &format.format)?.with_missing(LOG_MISSING);
            log_formats.insert(format.name.clone(), template);
        }

        let variables = builder.finalize()?;

        tracing::info!(
            variables = variables.len(),
            maps = config.maps.len(),
            log_formats = log_formats.len(),
            max_captures = variables.max_captures(),
            "variable engine configured"
        );

        Ok(Self {
            variables,
            log_formats,
            server: ServerInfo::from_config(&config.server, tracker).shared(),
            arena: config.arena.clone(),
        })
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn server(&self) -> &Arc<ServerInfo> {
        &self.server
    }

    /// A compiled log format by name.
    pub fn log_format(&self, name: &str) -> Result<&Template, ConfigError> {
        self.log_formats
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLogFormat(name.to_string()))
    }

    fn new_arena(&self) -> Arena {
        Arena::new(self.arena.chunk_size, self.arena.limit_bytes)
    }

    /// An empty request bound to this engine's server context and slot layout.
    pub fn new_request(&self) -> Request {
        let mut request = Request::new(Arc::clone(&self.server), self.new_arena());
        self.variables.prepare(&mut request);
        request
    }

    /// A request built from an incoming request head.
    pub fn ingest(&self, parts: &Parts, connection: ConnectionInfo) -> Request {
        let mut request =
            ingest::request_from_parts(parts, connection, Arc::clone(&self.server), self.new_arena());
        self.variables.prepare(&mut request);
        request
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("variables", &self.variables.len())
            .field("log_formats", &self.log_formats.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormatConfig, MapConfig, MapEntry};

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.server.server_name = "example.com".into();
        config.maps.push(MapConfig {
            variable: "$backend".into(),
            source: "$http_host".into(),
            default: Some("default".into()),
            hostnames: true,
            volatile: false,
            entries: vec![MapEntry {
                key: "api.example.com".into(),
                value: "api".into(),
            }],
        });
        config.log_formats.push(LogFormatConfig {
            name: "main".into(),
            format: "$server_name $backend $remote_user".into(),
        });
        config
    }

    #[test]
    fn test_from_config_registers_everything() {
        let engine = Engine::from_config(&config()).unwrap();
        assert!(engine.variables().index_of("backend").is_some());
        assert!(engine.variables().is_named("remote_addr"));
        assert!(engine.log_format("main").is_ok());
        assert!(matches!(
            engine.log_format("combined"),
            Err(ConfigError::UnknownLogFormat(_))
        ));
    }

    #[test]
    fn test_log_format_renders_dash_for_missing() {
        let engine = Engine::from_config(&config()).unwrap();
        let mut request = engine.new_request();
        request.add_header("Host", "API.example.com.");

        let format = engine.log_format("main").unwrap();
        let mut eval = engine.variables().evaluate(&mut request);
        let line = format.render(&mut eval).unwrap();
        assert_eq!(&line[..], b"example.com api -");
    }

    #[test]
    fn test_unknown_variable_in_log_format_fails() {
        let mut config = config();
        config.log_formats.push(LogFormatConfig {
            name: "broken".into(),
            format: "$no_such_thing".into(),
        });
        assert!(matches!(
            Engine::from_config(&config),
            Err(ConfigError::UnknownVariable(name)) if name == "no_such_thing"
        ));
    }
}

//! Atomic engine replacement on configuration reload.
//!
//! # Design Decisions
//! - Readers `load()` a snapshot once per request and keep it until the request ends,
//!   so indices assigned by one configuration are never read against another
//! - A failed rebuild leaves the current engine in place
//! - Connection counters carry over to the new engine

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{load_config, LoadError};
use crate::config::schema::EngineConfig;
use crate::engine::Engine;
use crate::variables::ConfigError;

/// Shared handle to the live engine.
#[derive(Debug)]
pub struct EngineHandle {
    current: ArcSwap<Engine>,
}

impl EngineHandle {
    pub fn new(engine: Engine) -> Self {
        Self {
            current: ArcSwap::from_pointee(engine),
        }
    }

    /// Build the first engine from `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Engine::from_config(config)?))
    }

    /// Snapshot of the live engine.
    pub fn load(&self) -> Arc<Engine> {
        self.current.load_full()
    }

    /// Build a new engine from `config` and swap it in.
    pub fn reload(&self, config: &EngineConfig) -> Result<Arc<Engine>, ConfigError> {
        let tracker = self.current.load().server().stats.clone();
        let engine = match Engine::with_tracker(config, tracker) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::error!(error = %e, "reload failed, keeping current configuration");
                return Err(e);
            }
        };

        self.current.store(Arc::clone(&engine));
        tracing::info!(variables = engine.variables().len(), "engine reloaded");
        Ok(engine)
    }

    /// Load, validate and apply the configuration file at `path`.
    pub fn reload_from_path(&self, path: &Path) -> Result<Arc<Engine>, LoadError> {
        let config = load_config(path)?;
        self.reload(&config).map_err(LoadError::Engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    #[test]
    fn test_old_snapshot_survives_reload() {
        let handle = EngineHandle::from_config(&EngineConfig::default()).unwrap();
        let before = handle.load();

        let mut config = EngineConfig::default();
        config.maps.push(MapConfig {
            variable: "tier".into(),
            source: "$http_host".into(),
            ..MapConfig::default()
        });
        handle.reload(&config).unwrap();

        assert!(!before.variables().is_named("tier"));
        assert!(handle.load().variables().is_named("tier"));
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let handle = EngineHandle::from_config(&EngineConfig::default()).unwrap();
        let mut config = EngineConfig::default();
        config.maps.push(MapConfig {
            variable: "tier".into(),
            source: "$missing_var".into(),
            ..MapConfig::default()
        });

        assert!(handle.reload(&config).is_err());
        assert!(!handle.load().variables().is_named("tier"));
    }
}

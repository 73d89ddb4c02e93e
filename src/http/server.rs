//! Server-level context shared by every request of one configuration.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::ServerConfig;
use crate::net::connection::ConnectionTracker;

/// Read-only server context consulted by built-in variables.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Primary server name (`$server_name`, `$host` fallback).
    pub server_name: Bytes,
    /// Document root (`$document_root`).
    pub root: PathBuf,
    /// Machine hostname (`$hostname`).
    pub hostname: Bytes,
    /// Keepalive timeout advertised in `Keep-Alive: timeout=N`; 0 disables it.
    pub keepalive_header: u64,
    /// Connection counters (`$connections_*`).
    pub stats: ConnectionTracker,
}

impl ServerInfo {
    pub fn from_config(config: &ServerConfig, stats: ConnectionTracker) -> Self {
        let hostname = if config.hostname.is_empty() {
            system_hostname()
        } else {
            config.hostname.clone()
        };
        Self {
            server_name: Bytes::from(config.server_name.clone()),
            root: PathBuf::from(&config.root),
            hostname: Bytes::from(hostname),
            keepalive_header: config.keepalive_timeout_secs,
            stats,
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default(), ConnectionTracker::new())
    }
}

fn system_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

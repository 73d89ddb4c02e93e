//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::Request as HttpRequest;
use proxy_variables::config::EngineConfig;
use proxy_variables::http::ConnectionInfo;
use proxy_variables::variables::{Evaluation, EvaluationError, VariableGetter, VariableValue};
use proxy_variables::{Engine, Request};

/// Engine with the core variables only.
pub fn engine() -> Engine {
    Engine::from_config(&EngineConfig::default()).unwrap()
}

/// Engine built from TOML text.
pub fn engine_from_toml(text: &str) -> Engine {
    let config = proxy_variables::config::load_config_str(text).unwrap();
    Engine::from_config(&config).unwrap()
}

pub fn connection(remote: &str, local: &str) -> ConnectionInfo {
    ConnectionInfo {
        number: 7,
        requests: 1,
        remote: Some(remote.parse::<SocketAddr>().unwrap()),
        local: Some(local.parse::<SocketAddr>().unwrap()),
        ..ConnectionInfo::default()
    }
}

/// A request for `uri` with the given headers, as ingested from a client.
pub fn request(engine: &Engine, uri: &str, headers: &[(&str, &str)]) -> Request {
    let mut builder = HttpRequest::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (parts, ()) = builder.body(()).unwrap().into_parts();
    engine.ingest(&parts, connection("192.0.2.10:51000", "198.51.100.1:80"))
}

/// Counts how many times it has been called and returns the count.
#[derive(Debug, Default, Clone)]
pub struct CountingGetter {
    pub calls: Arc<AtomicUsize>,
}

impl CountingGetter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VariableGetter for CountingGetter {
    fn get(&self, _: &mut Evaluation<'_>, _: &str) -> Result<VariableValue, EvaluationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(VariableValue::valid(n.to_string()))
    }
}

pub fn text(value: &VariableValue) -> String {
    value.to_string_lossy()
}

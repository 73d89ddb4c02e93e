//! HTTP Variable Resolution Engine

pub mod builtins;
pub mod config;
pub mod engine;
pub mod hash;
pub mod http;
pub mod map;
pub mod net;
pub mod observability;
pub mod regex;
pub mod template;
pub mod variables;

pub use config::schema::EngineConfig;
pub use config::EngineHandle;
pub use engine::Engine;
pub use http::Request;
pub use template::Template;
pub use variables::{
    ConfigError, Evaluation, EvaluationError, VariableFlags, VariableIndex, VariableValue,
    Variables, VariablesBuilder,
};

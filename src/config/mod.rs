//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → Engine::from_config (register, finalize)
//!
//! On reload:
//!     → loader.rs loads new config
//!     → reload.rs builds a new Engine
//!     → atomic swap of Arc<Engine>
//!     → new requests observe the new engine
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod reload;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_str, LoadError};
pub use reload::EngineHandle;
pub use schema::{
    ArenaConfig, EngineConfig, LogFormatConfig, MapConfig, MapEntry, ObservabilityConfig,
    ServerConfig, VariablesConfig,
};
pub use validation::{validate_config, ValidationError};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (hash sizes, depth, arena chunk)
//! - Check map and log format definitions for missing or duplicate names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; variable resolution
//!   errors surface later from `Engine::from_config`

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::EngineConfig;

/// A single semantic problem, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let vars = &config.variables;
    if vars.hash_max_size == 0 {
        errors.push(ValidationError::new(
            "variables.hash_max_size",
            "must be greater than 0",
        ));
    }
    if vars.hash_bucket_size < 2 * std::mem::size_of::<usize>() {
        errors.push(ValidationError::new(
            "variables.hash_bucket_size",
            format!("must be at least {}", 2 * std::mem::size_of::<usize>()),
        ));
    }
    if vars.max_depth == 0 {
        errors.push(ValidationError::new(
            "variables.max_depth",
            "must be greater than 0",
        ));
    }

    if config.arena.chunk_size == 0 {
        errors.push(ValidationError::new("arena.chunk_size", "must be greater than 0"));
    }
    if config.arena.limit_bytes == Some(0) {
        errors.push(ValidationError::new("arena.limit_bytes", "must be greater than 0"));
    }

    let mut map_names = HashSet::new();
    for (i, map) in config.maps.iter().enumerate() {
        let name = map.variable.trim_start_matches('$');
        if name.is_empty() {
            errors.push(ValidationError::new(
                format!("maps[{}].variable", i),
                "must not be empty",
            ));
        } else if !map_names.insert(name.to_ascii_lowercase()) {
            errors.push(ValidationError::new(
                format!("maps[{}].variable", i),
                format!("duplicate map variable \"{}\"", name),
            ));
        }
        if map.source.is_empty() {
            errors.push(ValidationError::new(
                format!("maps[{}].source", i),
                "must not be empty",
            ));
        }
        for (j, entry) in map.entries.iter().enumerate() {
            if entry.key.is_empty() {
                errors.push(ValidationError::new(
                    format!("maps[{}].entries[{}].key", i, j),
                    "must not be empty",
                ));
            }
        }
    }

    let mut format_names = HashSet::new();
    for (i, format) in config.log_formats.iter().enumerate() {
        if format.name.is_empty() {
            errors.push(ValidationError::new(
                format!("log_formats[{}].name", i),
                "must not be empty",
            ));
        } else if !format_names.insert(format.name.as_str()) {
            errors.push(ValidationError::new(
                format!("log_formats[{}].name", i),
                format!("duplicate log format \"{}\"", format.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormatConfig, MapConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.variables.max_depth = 0;
        config.arena.chunk_size = 0;
        config.maps.push(MapConfig {
            variable: "$".into(),
            source: String::new(),
            ..Default::default()
        });
        config.log_formats.push(LogFormatConfig {
            name: "main".into(),
            format: "$remote_addr".into(),
        });
        config.log_formats.push(LogFormatConfig {
            name: "main".into(),
            format: "$uri".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "variables.max_depth",
                "arena.chunk_size",
                "maps[0].variable",
                "maps[0].source",
                "log_formats[1].name",
            ]
        );
    }
}

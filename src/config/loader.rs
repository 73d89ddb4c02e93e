//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::EngineConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::variables::ConfigError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Engine(ConfigError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Parse(e) => write!(f, "Parse error: {}", e),
            LoadError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            LoadError::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, LoadError> {
    let content = fs::read_to_string(path).map_err(LoadError::Io)?;
    load_config_str(&content)
}

/// Parse and validate configuration text.
pub fn load_config_str(content: &str) -> Result<EngineConfig, LoadError> {
    let config: EngineConfig = toml::from_str(content).map_err(LoadError::Parse)?;

    validate_config(&config).map_err(LoadError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[variables]
max_depth = 50

[server]
server_name = "example.com"

[[maps]]
variable = "$mobile"
source = "$http_user_agent"
default = "0"

[[maps.entries]]
key = "~*iphone"
value = "1"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.variables.max_depth, 50);
        assert_eq!(config.variables.hash_bucket_size, 64);
        assert_eq!(config.server.server_name, "example.com");
        assert_eq!(config.maps.len(), 1);
        assert_eq!(config.maps[0].entries[0].key, "~*iphone");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/engine.toml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_parse_and_validation_errors() {
        assert!(matches!(
            load_config_str("[variables\nmax_depth = 1"),
            Err(LoadError::Parse(_))
        ));

        let err = load_config_str("[variables]\nmax_depth = 0").unwrap_err();
        assert!(err.to_string().contains("variables.max_depth"));
    }
}

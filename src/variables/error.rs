//! Error definitions for configuration and evaluation.

use thiserror::Error;

/// Fatal configuration-time errors; each one aborts loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A reference to `$` with no name.
    #[error("invalid variable name \"$\"")]
    EmptyName,

    /// A second registration of a variable that is not changeable.
    #[error("the duplicate \"{0}\" variable")]
    DuplicateVariable(String),

    /// An indexed variable that no registration or prefix can resolve.
    #[error("unknown \"{0}\" variable")]
    UnknownVariable(String),

    /// The regex engine rejected a pattern.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No bucket count within bounds fits the key set.
    #[error(
        "could not build {name}, you should increase either {name}_max_size ({max_size}) \
         or {name}_bucket_size ({bucket_size})"
    )]
    HashTooSmall {
        name: String,
        max_size: usize,
        bucket_size: usize,
    },

    /// The same key appears twice in a map.
    #[error("conflicting map key \"{0}\"")]
    ConflictingMapKey(String),

    /// A malformed wildcard key.
    #[error("invalid wildcard key \"{0}\"")]
    InvalidWildcard(String),

    /// Template text with a malformed variable reference.
    #[error("invalid template \"{template}\": {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A log format name that was never defined.
    #[error("unknown log format \"{0}\"")]
    UnknownLogFormat(String),
}

/// Per-request evaluation failures. Fatal for the current step only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// An index outside the compiled table.
    #[error("unknown variable index: {0}")]
    UnknownIndex(usize),

    /// The request arena refused an allocation.
    #[error("allocation of {requested} bytes exceeds request arena limit {limit}")]
    Allocation { requested: usize, limit: usize },

    /// Request state the getter cannot interpret.
    #[error("malformed request state: {0}")]
    MalformedRequest(String),

    /// The regex engine failed while matching.
    #[error("regex exec failed on \"{subject}\" using \"{pattern}\": {reason}")]
    RegexFault {
        pattern: String,
        subject: String,
        reason: String,
    },

    /// Any other getter failure.
    #[error("variable getter failed: {0}")]
    Getter(String),
}

impl EvaluationError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::UnknownIndex(_) => "unknown_index",
            EvaluationError::Allocation { .. } => "allocation",
            EvaluationError::MalformedRequest(_) => "malformed_request",
            EvaluationError::RegexFault { .. } => "regex_fault",
            EvaluationError::Getter(_) => "getter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::DuplicateVariable("host".into());
        assert_eq!(err.to_string(), "the duplicate \"host\" variable");

        let err = ConfigError::UnknownVariable("foo".into());
        assert_eq!(err.to_string(), "unknown \"foo\" variable");

        let err = ConfigError::HashTooSmall {
            name: "variables_hash".into(),
            max_size: 4,
            bucket_size: 32,
        };
        assert!(err.to_string().contains("variables_hash_max_size"));
    }

    #[test]
    fn test_evaluation_error_kind() {
        assert_eq!(EvaluationError::UnknownIndex(3).kind(), "unknown_index");
        assert_eq!(
            EvaluationError::Allocation { requested: 1, limit: 0 }.to_string(),
            "allocation of 1 bytes exceeds request arena limit 0"
        );
    }
}

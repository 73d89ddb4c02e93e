//! Text with pre-resolved variable references.
//!
//! # Responsibilities
//! - Split `"$remote_addr - ${remote_user} [$time_local]"` into literals and references
//! - Assign indices for every referenced name at configuration time
//! - Render against an evaluation, reading through the flushed cache
//!
//! # Design Decisions
//! - `$1`..`$9` read the captures of the last successful regex match
//! - Missing values render as a placeholder: empty by default, `-` for log formats

use bytes::Bytes;

use crate::variables::{ConfigError, Evaluation, EvaluationError, VariableIndex, VariablesBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(Bytes),
    Variable(VariableIndex),
    Capture(usize),
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
    missing: Bytes,
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl Template {
    /// Parse `text`, assigning an index to every referenced variable.
    pub fn compile(builder: &mut VariablesBuilder, text: &str) -> Result<Self, ConfigError> {
        let bytes = text.as_bytes();
        let mut parts = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: text.to_string(),
            reason: reason.to_string(),
        };

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }

            if i > literal_start {
                parts.push(Part::Literal(Bytes::copy_from_slice(&bytes[literal_start..i])));
            }
            i += 1;

            // $1 .. $9
            if let Some(&d) = bytes.get(i) {
                if d.is_ascii_digit() {
                    parts.push(Part::Capture((d - b'0') as usize));
                    i += 1;
                    literal_start = i;
                    continue;
                }
            }

            let bracketed = bytes.get(i) == Some(&b'{');
            if bracketed {
                i += 1;
            }

            let start = i;
            while i < bytes.len() && is_name_char(bytes[i]) {
                i += 1;
            }
            if i == start {
                return Err(ConfigError::EmptyName);
            }
            let name = &text[start..i];

            if bracketed {
                if bytes.get(i) != Some(&b'}') {
                    return Err(invalid("the closing bracket is missing"));
                }
                i += 1;
            }

            parts.push(Part::Variable(builder.get_or_assign_index(name)?));
            literal_start = i;
        }

        if literal_start < bytes.len() {
            parts.push(Part::Literal(Bytes::copy_from_slice(&bytes[literal_start..])));
        }

        Ok(Self {
            source: text.to_string(),
            parts,
            missing: Bytes::new(),
        })
    }

    /// Placeholder rendered for not-found values.
    pub fn with_missing(mut self, placeholder: impl Into<Bytes>) -> Self {
        self.missing = placeholder.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template has no references.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, Part::Literal(_)))
    }

    /// The index when the whole template is one variable reference.
    pub fn as_single_variable(&self) -> Option<VariableIndex> {
        match self.parts.as_slice() {
            [Part::Variable(index)] => Some(*index),
            _ => None,
        }
    }

    /// Indices referenced, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = VariableIndex> + '_ {
        self.parts.iter().filter_map(|p| match p {
            Part::Variable(index) => Some(*index),
            _ => None,
        })
    }

    /// Render into the request arena.
    pub fn render(&self, eval: &mut Evaluation<'_>) -> Result<Bytes, EvaluationError> {
        if let [Part::Literal(text)] = self.parts.as_slice() {
            return Ok(text.clone());
        }

        let mut pieces = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let piece = match part {
                Part::Literal(text) => text.clone(),
                Part::Variable(index) => eval
                    .get_flushed(*index)?
                    .into_option()
                    .unwrap_or_else(|| self.missing.clone()),
                Part::Capture(n) => eval.capture(*n).unwrap_or_else(|| self.missing.clone()),
            };
            pieces.push(piece);
        }

        eval.arena().join(pieces.iter().map(|p| &p[..]), b"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariablesBuilder;

    #[test]
    fn test_parse_forms() {
        let mut builder = VariablesBuilder::default();
        let t = Template::compile(&mut builder, "$host:${server_port}/$1x").unwrap();

        let host = builder.get_or_assign_index("host").unwrap();
        let port = builder.get_or_assign_index("server_port").unwrap();
        assert_eq!(
            t.parts,
            vec![
                Part::Variable(host),
                Part::Literal(Bytes::from_static(b":")),
                Part::Variable(port),
                Part::Literal(Bytes::from_static(b"/")),
                Part::Capture(1),
                Part::Literal(Bytes::from_static(b"x")),
            ]
        );
        assert!(!t.is_literal());
        assert_eq!(t.variables().count(), 2);
    }

    #[test]
    fn test_single_variable_and_literal() {
        let mut builder = VariablesBuilder::default();
        let t = Template::compile(&mut builder, "$uri").unwrap();
        assert!(t.as_single_variable().is_some());

        let t = Template::compile(&mut builder, "plain text").unwrap();
        assert!(t.is_literal());
        assert_eq!(builder.indexed_len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        let mut builder = VariablesBuilder::default();
        assert_eq!(
            Template::compile(&mut builder, "cost: $").unwrap_err(),
            ConfigError::EmptyName
        );
        assert!(matches!(
            Template::compile(&mut builder, "${host"),
            Err(ConfigError::InvalidTemplate { .. })
        ));
    }
}

//! Regex engine seam.
//!
//! # Responsibilities
//! - Compile patterns and report capture counts and named groups
//! - Execute into a caller-provided offset buffer
//! - Report engine faults separately from "no match"
//!
//! # Design Decisions
//! - `Pattern` is a trait so tests and embedders can plug in other engines
//! - The default engine is `regex::bytes`, which matches arbitrary bytes

use std::fmt;

use ::regex::bytes::{Regex, RegexBuilder};

use crate::variables::ConfigError;

/// Compiled size limit for a single pattern.
const SIZE_LIMIT: usize = 10 * (1 << 20);

/// Group offsets, indexed by group number; group 0 is the whole match.
pub type Offsets = [Option<(usize, usize)>];

/// A compiled pattern.
pub trait Pattern: Send + Sync + fmt::Debug {
    /// Pattern text as configured.
    fn source(&self) -> &str;

    /// Number of capture groups, not counting the whole match.
    fn captures_len(&self) -> usize;

    /// `(name, group)` for every named group.
    fn named_groups(&self) -> Vec<(String, usize)>;

    /// Match `subject`, writing group offsets into `offsets`.
    ///
    /// Returns the number of groups written on a match, `None` when nothing
    /// matched and `Err` when the engine could not complete.
    fn exec(&self, subject: &[u8], offsets: &mut Offsets) -> Result<Option<usize>, String>;
}

/// `Pattern` over `regex::bytes::Regex`.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Regex,
}

impl RegexPattern {
    /// Compile `source`; `caseless` matches ASCII and Unicode case-insensitively.
    pub fn compile(source: &str, caseless: bool) -> Result<Self, ConfigError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(caseless)
            .size_limit(SIZE_LIMIT)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }
}

impl Pattern for RegexPattern {
    fn source(&self) -> &str {
        &self.source
    }

    fn captures_len(&self) -> usize {
        self.regex.captures_len() - 1
    }

    fn named_groups(&self) -> Vec<(String, usize)> {
        self.regex
            .capture_names()
            .enumerate()
            .filter_map(|(i, name)| name.map(|n| (n.to_string(), i)))
            .collect()
    }

    fn exec(&self, subject: &[u8], offsets: &mut Offsets) -> Result<Option<usize>, String> {
        let mut locs = self.regex.capture_locations();
        if offsets.len() < locs.len() {
            return Err(format!(
                "offset buffer holds {} groups, pattern needs {}",
                offsets.len(),
                locs.len()
            ));
        }

        if self.regex.captures_read(&mut locs, subject).is_none() {
            return Ok(None);
        }

        for (group, slot) in offsets.iter_mut().enumerate().take(locs.len()) {
            *slot = locs.get(group);
        }
        Ok(Some(locs.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_groups_and_offsets() {
        let p = RegexPattern::compile(r"^(?<year>\d{4})-(?<month>\d{2})$", false).unwrap();
        assert_eq!(p.captures_len(), 2);
        assert_eq!(
            p.named_groups(),
            vec![("year".to_string(), 1), ("month".to_string(), 2)]
        );

        let mut offsets: Vec<Option<(usize, usize)>> = vec![None; 3];
        assert_eq!(p.exec(b"2024-05", &mut offsets), Ok(Some(3)));
        assert_eq!(offsets[1], Some((0, 4)));
        assert_eq!(offsets[2], Some((5, 7)));

        assert_eq!(p.exec(b"bad", &mut offsets), Ok(None));
    }

    #[test]
    fn test_small_buffer_is_fault() {
        let p = RegexPattern::compile(r"(a)(b)", false).unwrap();
        let mut offsets: Vec<Option<(usize, usize)>> = vec![None; 1];
        assert!(p.exec(b"ab", &mut offsets).is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RegexPattern::compile("(unclosed", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_caseless() {
        let p = RegexPattern::compile(r"^mozilla", true).unwrap();
        let mut offsets: Vec<Option<(usize, usize)>> = vec![None; 1];
        assert_eq!(p.exec(b"Mozilla/5.0", &mut offsets), Ok(Some(1)));
    }
}

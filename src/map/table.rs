//! Map lookup table: exact/wildcard hash plus ordered regex keys.
//!
//! # Responsibilities
//! - Classify keys: `~pattern` and `~*pattern` are regexes, everything else hashes
//! - Look up exact/wildcard keys first, then regexes in configuration order
//! - Distinguish "no match" from a regex engine fault
//!
//! # Design Decisions
//! - Exact keys are folded to lowercase; the subject is folded into the arena before hashing
//! - A leading `\` escapes a key that would otherwise start with `~`
//! - Regex keys match the original subject; caseless matching is `~*`

use bytes::Bytes;

use crate::hash::{hash_key, CombinedHash, HashKeys, HashSizing};
use crate::observability::metrics;
use crate::regex::{CompiledRegex, RegexMatch};
use crate::variables::{ConfigError, Evaluation, EvaluationError, VariablesBuilder};

/// Key collection for one map.
#[derive(Debug)]
pub struct MapBuilder<V> {
    name: String,
    hostnames: bool,
    keys: HashKeys<V>,
    regex: Vec<(CompiledRegex, V)>,
}

impl<V> MapBuilder<V> {
    /// `name` appears in sizing diagnostics; `hostnames` enables wildcard keys.
    pub fn new(name: impl Into<String>, hostnames: bool) -> Self {
        Self {
            name: name.into(),
            hostnames,
            keys: HashKeys::new(),
            regex: Vec::new(),
        }
    }

    /// Add one key. Regex keys bind their named groups through `vars`.
    pub fn add(
        &mut self,
        vars: &mut VariablesBuilder,
        key: &str,
        value: V,
    ) -> Result<(), ConfigError> {
        if let Some(pattern) = key.strip_prefix("~*") {
            let re = vars.compile_regex(pattern, true)?;
            self.regex.push((re, value));
            return Ok(());
        }
        if let Some(pattern) = key.strip_prefix('~') {
            let re = vars.compile_regex(pattern, false)?;
            self.regex.push((re, value));
            return Ok(());
        }

        let key = key.strip_prefix('\\').unwrap_or(key);
        self.keys.add(key, value, self.hostnames)
    }

    pub fn build(self, sizing: HashSizing) -> Result<MapTable<V>, ConfigError> {
        let hash = CombinedHash::build(&self.name, self.keys, sizing)?;
        Ok(MapTable {
            hash,
            regex: self.regex,
            hostnames: self.hostnames,
        })
    }
}

/// Immutable map table.
#[derive(Debug)]
pub struct MapTable<V> {
    hash: CombinedHash<V>,
    regex: Vec<(CompiledRegex, V)>,
    hostnames: bool,
}

impl<V> MapTable<V> {
    /// Find the value for `subject`; `Ok(None)` lets the caller fall back to a default.
    pub fn find<'t>(
        &'t self,
        eval: &mut Evaluation<'_>,
        subject: &Bytes,
    ) -> Result<Option<&'t V>, EvaluationError> {
        let mut key: &[u8] = subject;
        if self.hostnames && key.last() == Some(&b'.') {
            key = &key[..key.len() - 1];
        }

        // 1. Exact and wildcard keys
        let lower = eval.arena().lowercase(key)?;
        if let Some(value) = self.hash.find(hash_key(&lower), &lower) {
            metrics::record_map_lookup("exact");
            return Ok(Some(value));
        }

        // 2. Regex keys, first match wins
        if subject.is_empty() {
            return Ok(None);
        }
        for (re, value) in &self.regex {
            match eval.exec_regex(re, subject) {
                Ok(RegexMatch::Matched) => {
                    metrics::record_map_lookup("regex");
                    return Ok(Some(value));
                }
                Ok(RegexMatch::Declined) => continue,
                Err(e) => {
                    metrics::record_map_lookup("fault");
                    return Err(e);
                }
            }
        }

        Ok(None)
    }

    pub fn regex_len(&self) -> usize {
        self.regex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty() && self.regex.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;

    fn build(
        vars: &mut VariablesBuilder,
        hostnames: bool,
        entries: &[(&str, u32)],
    ) -> MapTable<u32> {
        let mut map = MapBuilder::new("map_hash", hostnames);
        for &(key, value) in entries {
            map.add(vars, key, value).unwrap();
        }
        map.build(HashSizing::default()).unwrap()
    }

    fn find(table: &MapTable<u32>, vars: VariablesBuilder, subject: &'static [u8]) -> Option<u32> {
        let vars = vars.finalize().unwrap();
        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);
        table
            .find(&mut eval, &Bytes::from_static(subject))
            .unwrap()
            .copied()
    }

    #[test]
    fn test_exact_beats_regex() {
        let mut vars = VariablesBuilder::default();
        let table = build(&mut vars, false, &[("~^example", 2), ("Example.com", 1)]);
        assert_eq!(find(&table, vars, b"EXAMPLE.com"), Some(1));
    }

    #[test]
    fn test_first_regex_wins() {
        let mut vars = VariablesBuilder::default();
        let table = build(&mut vars, false, &[("~*mobile", 1), ("~*mob", 2)]);
        assert_eq!(find(&table, vars, b"Some Mobile Agent"), Some(1));
    }

    #[test]
    fn test_no_match_is_none() {
        let mut vars = VariablesBuilder::default();
        let table = build(&mut vars, false, &[("a", 1), ("~^b", 2)]);
        assert_eq!(find(&table, vars, b"c"), None);
    }

    #[test]
    fn test_hostnames_wildcards_and_trailing_dot() {
        let mut vars = VariablesBuilder::default();
        let table = build(
            &mut vars,
            true,
            &[("*.example.com", 1), ("www.example.*", 2), ("example.org", 3)],
        );
        let vars = vars.finalize().unwrap();
        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);

        let mut lookup = |s: &'static [u8]| {
            table
                .find(&mut eval, &Bytes::from_static(s))
                .unwrap()
                .copied()
        };
        assert_eq!(lookup(b"api.example.com"), Some(1));
        assert_eq!(lookup(b"www.example.net"), Some(2));
        assert_eq!(lookup(b"example.org."), Some(3));
    }

    #[test]
    fn test_escaped_tilde_is_literal() {
        let mut vars = VariablesBuilder::default();
        let table = build(&mut vars, false, &[("\\~home", 1)]);
        assert_eq!(find(&table, vars, b"~home"), Some(1));
    }
}

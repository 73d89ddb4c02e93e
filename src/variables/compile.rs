//! Finalize: turn the mutable registry into an immutable snapshot.
//!
//! # Data Flow
//! ```text
//! VariablesBuilder
//!     → resolve every indexed name (exact, then longest prefix)
//!     → drop NOHASH entries, build the by-name hash table
//!     → Variables (shared read-only by every request)
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::hash::{hash_key, HashTable};
use crate::http::Request;
use crate::variables::prefix::{self, Prefixed};
use crate::variables::{
    ConfigError, Descriptor, Evaluation, EvaluationError, Getter, Setter, VariableFlags,
    VariableIndex, VariableValue, VariablesBuilder,
};

/// Name of the by-name table, used in sizing diagnostics.
pub const VARIABLES_HASH: &str = "variables_hash";

/// A resolved indexed slot descriptor.
#[derive(Debug, Clone)]
pub struct IndexedVariable {
    pub(crate) name: Arc<str>,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    pub(crate) flags: VariableFlags,
}

impl IndexedVariable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> VariableFlags {
        self.flags
    }
}

/// An entry of the by-name table.
#[derive(Debug, Clone)]
pub(crate) struct NamedVariable {
    pub(crate) name: Arc<str>,
    pub(crate) getter: Option<Getter>,
    pub(crate) flags: VariableFlags,
    pub(crate) index: Option<VariableIndex>,
}

/// A prefix family after finalize.
#[derive(Debug, Clone)]
pub(crate) struct PrefixVariable {
    pub(crate) name: Arc<str>,
    pub(crate) getter: Option<Getter>,
    pub(crate) flags: VariableFlags,
}

impl Prefixed for PrefixVariable {
    fn prefix(&self) -> &str {
        &self.name
    }
}

impl Prefixed for Descriptor {
    fn prefix(&self) -> &str {
        &self.name
    }
}

/// Compiled variable configuration.
#[derive(Debug)]
pub struct Variables {
    pub(crate) indexed: Vec<IndexedVariable>,
    pub(crate) named: HashTable<NamedVariable>,
    pub(crate) prefixes: Vec<PrefixVariable>,
    pub(crate) max_captures: usize,
    pub(crate) max_depth: usize,
}

impl VariablesBuilder {
    /// Resolve every indexed name and build the by-name table.
    ///
    /// Consumes the builder, so it runs exactly once per configuration.
    pub fn finalize(mut self) -> Result<Variables, ConfigError> {
        let mut indexed = Vec::with_capacity(self.indexed.len());

        for (i, name) in self.indexed.iter().enumerate() {
            let mut resolved = IndexedVariable {
                name: name.clone(),
                getter: None,
                setter: None,
                flags: VariableFlags::empty(),
            };

            // 1. Exact registration
            let mut fall_through = true;
            if let Some(exact) = self.exact.iter_mut().find(|d| d.name == *name) {
                exact.flags |= VariableFlags::INDEXED;
                resolved.getter = exact.getter.clone();
                resolved.setter = exact.setter.clone();
                resolved.flags = exact.flags;
                fall_through =
                    exact.getter.is_none() || exact.flags.contains(VariableFlags::WEAK);
            }

            // 2. Longest prefix, for names without an authoritative getter
            if fall_through {
                if let Some(p) = prefix::longest_match(&self.prefixes, name) {
                    resolved.getter = p.getter.clone();
                    resolved.flags = p.flags;
                } else if resolved.getter.is_none() {
                    return Err(ConfigError::UnknownVariable(name.to_string()));
                }
            }

            indexed.push(resolved);
            tracing::trace!(variable = %name, index = i, "indexed variable resolved");
        }

        // 3. By-name table, excluding index-only entries
        let keys: Vec<(Vec<u8>, NamedVariable)> = self
            .exact
            .iter()
            .filter(|d| !d.flags.contains(VariableFlags::NOHASH))
            .map(|d| {
                let index = self
                    .indexed
                    .iter()
                    .position(|n| *n == d.name)
                    .map(VariableIndex);
                let entry = NamedVariable {
                    name: d.name.clone(),
                    getter: d.getter.clone(),
                    flags: d.flags,
                    index,
                };
                (d.name.as_bytes().to_vec(), entry)
            })
            .collect();

        let named = HashTable::build(VARIABLES_HASH, keys, self.sizing)?;

        let prefixes = self
            .prefixes
            .into_iter()
            .map(|p| PrefixVariable {
                name: p.name,
                getter: p.getter,
                flags: p.flags,
            })
            .collect();

        tracing::debug!(
            indexed = indexed.len(),
            named = named.len(),
            max_captures = self.max_captures,
            "variables finalized"
        );

        Ok(Variables {
            indexed,
            named,
            prefixes,
            max_captures: self.max_captures,
            max_depth: self.max_depth,
        })
    }
}

impl Variables {
    /// Number of indexed slots a request needs.
    pub fn len(&self) -> usize {
        self.indexed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }

    pub fn max_captures(&self) -> usize {
        self.max_captures
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Indexed descriptor at `index`.
    pub fn indexed(&self, index: VariableIndex) -> Option<&IndexedVariable> {
        self.indexed.get(index.get())
    }

    /// Index assigned to `name`, if configuration referenced it.
    pub fn index_of(&self, name: &str) -> Option<VariableIndex> {
        self.indexed
            .iter()
            .position(|v| v.name.eq_ignore_ascii_case(name))
            .map(VariableIndex)
    }

    /// Whether `name` resolves through the by-name table.
    pub fn is_named(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.named
            .find(hash_key(lower.as_bytes()), lower.as_bytes())
            .is_some()
    }

    /// Size `request`'s slot array for this configuration.
    pub fn prepare(&self, request: &mut Request) {
        request.variables.prepare(self.indexed.len(), self.max_captures);
    }

    /// Start an evaluation cycle for `request`.
    pub fn evaluate<'a>(&'a self, request: &'a mut Request) -> Evaluation<'a> {
        Evaluation::new(self, request)
    }

    pub fn get_by_index(
        &self,
        request: &mut Request,
        index: VariableIndex,
    ) -> Result<VariableValue, EvaluationError> {
        self.evaluate(request).get_by_index(index)
    }

    pub fn get_flushed(
        &self,
        request: &mut Request,
        index: VariableIndex,
    ) -> Result<VariableValue, EvaluationError> {
        self.evaluate(request).get_flushed(index)
    }

    pub fn get_by_name(
        &self,
        request: &mut Request,
        name: &str,
    ) -> Result<VariableValue, EvaluationError> {
        self.evaluate(request).get_by_name(name)
    }

    pub fn set_indexed(
        &self,
        request: &mut Request,
        index: VariableIndex,
        value: Bytes,
    ) -> Result<(), EvaluationError> {
        self.evaluate(request).set_indexed(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::PrefixFamily;
    use crate::hash::HashSizing;

    #[test]
    fn test_unknown_indexed_variable_fails() {
        let mut builder = VariablesBuilder::default();
        builder.get_or_assign_index("nope").unwrap();
        assert_eq!(
            builder.finalize().unwrap_err(),
            ConfigError::UnknownVariable("nope".into())
        );
    }

    #[test]
    fn test_indexed_falls_back_to_longest_prefix() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("http_", VariableFlags::PREFIX)
            .unwrap()
            .set_getter(Getter::Prefix(PrefixFamily::HeaderIn));
        builder
            .register("arg_", VariableFlags::PREFIX | VariableFlags::NOCACHEABLE)
            .unwrap()
            .set_getter(Getter::Prefix(PrefixFamily::Arg));

        let a = builder.get_or_assign_index("http_x_real_ip").unwrap();
        let b = builder.get_or_assign_index("arg_page").unwrap();
        let vars = builder.finalize().unwrap();

        assert!(matches!(
            vars.indexed(a).unwrap().getter,
            Some(Getter::Prefix(PrefixFamily::HeaderIn))
        ));
        assert!(vars
            .indexed(b)
            .unwrap()
            .flags()
            .contains(VariableFlags::NOCACHEABLE));
    }

    #[test]
    fn test_weak_exact_overridden_by_prefix() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("http_foo", VariableFlags::CHANGEABLE | VariableFlags::WEAK)
            .unwrap()
            .set_getter(Getter::CaptureNotFound);
        builder
            .register("http_", VariableFlags::PREFIX)
            .unwrap()
            .set_getter(Getter::Prefix(PrefixFamily::HeaderIn));
        let idx = builder.get_or_assign_index("http_foo").unwrap();

        let vars = builder.finalize().unwrap();
        assert!(matches!(
            vars.indexed(idx).unwrap().getter,
            Some(Getter::Prefix(PrefixFamily::HeaderIn))
        ));
    }

    #[test]
    fn test_weak_exact_kept_without_prefix() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("year", VariableFlags::CHANGEABLE | VariableFlags::WEAK)
            .unwrap()
            .set_getter(Getter::CaptureNotFound);
        let idx = builder.get_or_assign_index("year").unwrap();

        let vars = builder.finalize().unwrap();
        let v = vars.indexed(idx).unwrap();
        assert!(matches!(v.getter, Some(Getter::CaptureNotFound)));
        assert!(v.flags().contains(VariableFlags::INDEXED));
    }

    #[test]
    fn test_nohash_excluded_from_named() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("internal", VariableFlags::NOHASH)
            .unwrap()
            .set_getter(Getter::CaptureNotFound);
        builder
            .register("visible", VariableFlags::empty())
            .unwrap()
            .set_getter(Getter::CaptureNotFound);

        let vars = builder.finalize().unwrap();
        assert!(!vars.is_named("internal"));
        assert!(vars.is_named("VISIBLE"));
    }

    #[test]
    fn test_hash_too_small_reported() {
        let mut builder = VariablesBuilder::new(
            HashSizing {
                max_size: 1,
                bucket_size: 32,
            },
            100,
        );
        for name in ["a_long_variable_name", "another_long_name"] {
            builder
                .register(name, VariableFlags::empty())
                .unwrap()
                .set_getter(Getter::CaptureNotFound);
        }
        assert!(matches!(
            builder.finalize(),
            Err(ConfigError::HashTooSmall { .. })
        ));
    }
}

//! Configuration-time variable registry.
//!
//! # Responsibilities
//! - Register exact and prefix variables with duplicate/merge semantics
//! - Assign stable indices to every name referenced by configuration
//! - Track the widest regex capture count for the shared offset buffer
//!
//! # Design Decisions
//! - Names are stored lowercased; lookups are case-insensitive
//! - The builder is mutable; `finalize` (compile.rs) turns it into an immutable snapshot
//! - Index assignment is a linear scan: it runs only while loading configuration

use std::collections::HashMap;
use std::sync::Arc;

use crate::hash::HashSizing;
use crate::variables::{ConfigError, Getter, Setter, VariableFlags, VariableIndex};

/// Default recursion budget for nested evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// A registered variable or prefix family.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub(crate) name: Arc<str>,
    pub(crate) flags: VariableFlags,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl Descriptor {
    fn new(name: &str, flags: VariableFlags) -> Self {
        Self {
            name: Arc::from(name.to_ascii_lowercase()),
            flags,
            getter: None,
            setter: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> VariableFlags {
        self.flags
    }

    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    /// Install the getter.
    pub fn set_getter(&mut self, getter: Getter) -> &mut Self {
        self.getter = Some(getter);
        self
    }

    /// Install the setter.
    pub fn set_setter(&mut self, setter: Setter) -> &mut Self {
        self.setter = Some(setter);
        self
    }

    /// Add flags to the descriptor.
    pub fn insert_flags(&mut self, flags: VariableFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    /// Re-registration of a changeable descriptor: WEAK survives only if re-requested.
    fn merge(&mut self, flags: VariableFlags) {
        self.flags &= flags | !VariableFlags::WEAK;
    }
}

/// Mutable registration-time store.
#[derive(Debug)]
pub struct VariablesBuilder {
    pub(crate) exact: Vec<Descriptor>,
    exact_names: HashMap<Arc<str>, usize>,
    pub(crate) prefixes: Vec<Descriptor>,
    pub(crate) indexed: Vec<Arc<str>>,
    pub(crate) max_captures: usize,
    pub(crate) sizing: HashSizing,
    pub(crate) max_depth: usize,
}

impl Default for VariablesBuilder {
    fn default() -> Self {
        Self::new(
            HashSizing {
                max_size: 1024,
                bucket_size: 64,
            },
            DEFAULT_MAX_DEPTH,
        )
    }
}

impl VariablesBuilder {
    /// Create an empty registry with the given hash bounds and recursion budget.
    pub fn new(sizing: HashSizing, max_depth: usize) -> Self {
        Self {
            exact: Vec::new(),
            exact_names: HashMap::new(),
            prefixes: Vec::new(),
            indexed: Vec::new(),
            max_captures: 0,
            sizing,
            max_depth,
        }
    }

    /// Register a variable. `PREFIX` in `flags` routes to the prefix table.
    ///
    /// An existing, non-changeable registration fails with `DuplicateVariable`;
    /// a changeable one is merged and returned.
    pub fn register(
        &mut self,
        name: &str,
        flags: VariableFlags,
    ) -> Result<&mut Descriptor, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        if flags.contains(VariableFlags::PREFIX) {
            return self.register_prefix(name, flags);
        }

        let lower: Arc<str> = Arc::from(name.to_ascii_lowercase());
        if let Some(&pos) = self.exact_names.get(&lower) {
            let existing = &mut self.exact[pos];
            if !existing.flags.contains(VariableFlags::CHANGEABLE) {
                return Err(ConfigError::DuplicateVariable(name.to_string()));
            }
            existing.merge(flags);
            return Ok(existing);
        }

        self.exact_names.insert(lower, self.exact.len());
        self.exact.push(Descriptor::new(name, flags));
        let last = self.exact.len() - 1;
        Ok(&mut self.exact[last])
    }

    /// Register a prefix family, with the same duplicate/merge rules.
    pub fn register_prefix(
        &mut self,
        name: &str,
        flags: VariableFlags,
    ) -> Result<&mut Descriptor, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let flags = flags | VariableFlags::PREFIX;
        let pos = self
            .prefixes
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name));

        if let Some(pos) = pos {
            let existing = &mut self.prefixes[pos];
            if !existing.flags.contains(VariableFlags::CHANGEABLE) {
                return Err(ConfigError::DuplicateVariable(name.to_string()));
            }
            existing.merge(flags);
            return Ok(existing);
        }

        self.prefixes.push(Descriptor::new(name, flags));
        let last = self.prefixes.len() - 1;
        Ok(&mut self.prefixes[last])
    }

    /// Return the slot index for `name`, assigning the next one on first use.
    pub fn get_or_assign_index(&mut self, name: &str) -> Result<VariableIndex, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        if let Some(pos) = self
            .indexed
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
        {
            return Ok(VariableIndex(pos));
        }

        self.indexed.push(Arc::from(name.to_ascii_lowercase()));
        Ok(VariableIndex(self.indexed.len() - 1))
    }

    /// Declare a variable assigned by configuration (`set $name ...`).
    ///
    /// Reads before the first assignment warn and yield an empty value unless an
    /// authoritative getter is registered for the same name.
    pub fn declare_settable(&mut self, name: &str) -> Result<VariableIndex, ConfigError> {
        let descriptor = self.register(name, VariableFlags::CHANGEABLE)?;
        if descriptor.getter.is_none() {
            descriptor.set_getter(Getter::Uninitialized);
        }
        self.get_or_assign_index(name)
    }

    /// Exact descriptor by name.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        let lower = name.to_ascii_lowercase();
        self.exact_names
            .get(lower.as_str())
            .map(|&pos| &self.exact[pos])
    }

    /// Prefix descriptor by name.
    pub fn lookup_prefix(&self, name: &str) -> Option<&Descriptor> {
        self.prefixes
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Number of indices assigned so far.
    pub fn indexed_len(&self) -> usize {
        self.indexed.len()
    }

    /// Widest capture count seen across compiled patterns.
    pub fn max_captures(&self) -> usize {
        self.max_captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::Builtin;

    #[test]
    fn test_empty_name_rejected() {
        let mut builder = VariablesBuilder::default();
        assert_eq!(
            builder.register("", VariableFlags::empty()).unwrap_err(),
            ConfigError::EmptyName
        );
        assert_eq!(builder.get_or_assign_index("").unwrap_err(), ConfigError::EmptyName);
    }

    #[test]
    fn test_duplicate_without_changeable_fails() {
        let mut builder = VariablesBuilder::default();
        builder.register("Host", VariableFlags::empty()).unwrap();
        let err = builder.register("host", VariableFlags::empty()).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateVariable("host".into()));
    }

    #[test]
    fn test_changeable_merge_clears_weak() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("captured", VariableFlags::CHANGEABLE | VariableFlags::WEAK)
            .unwrap()
            .set_getter(Getter::CaptureNotFound);

        let again = builder.register("CAPTURED", VariableFlags::CHANGEABLE).unwrap();
        assert!(!again.flags().contains(VariableFlags::WEAK));
        assert!(matches!(again.getter(), Some(Getter::CaptureNotFound)));
    }

    #[test]
    fn test_changeable_merge_keeps_weak_when_requested() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("v", VariableFlags::CHANGEABLE | VariableFlags::WEAK)
            .unwrap();
        let again = builder
            .register("v", VariableFlags::CHANGEABLE | VariableFlags::WEAK)
            .unwrap();
        assert!(again.flags().contains(VariableFlags::WEAK));
    }

    #[test]
    fn test_prefix_routes_to_prefix_table() {
        let mut builder = VariablesBuilder::default();
        builder.register("http_", VariableFlags::PREFIX).unwrap();
        assert!(builder.lookup("http_").is_none());
        assert!(builder.lookup_prefix("HTTP_").is_some());
        assert!(matches!(
            builder.register_prefix("http_", VariableFlags::empty()),
            Err(ConfigError::DuplicateVariable(_))
        ));
    }

    #[test]
    fn test_index_is_stable() {
        let mut builder = VariablesBuilder::default();
        let a = builder.get_or_assign_index("remote_addr").unwrap();
        let b = builder.get_or_assign_index("uri").unwrap();
        let a2 = builder.get_or_assign_index("Remote_Addr").unwrap();
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(builder.indexed_len(), 2);
    }

    #[test]
    fn test_declare_settable_keeps_authoritative_getter() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("args", VariableFlags::CHANGEABLE)
            .unwrap()
            .set_getter(Getter::Builtin(Builtin::Args));
        builder.declare_settable("args").unwrap();
        assert!(matches!(
            builder.lookup("args").and_then(|d| d.getter()),
            Some(Getter::Builtin(Builtin::Args))
        ));

        builder.declare_settable("fresh").unwrap();
        assert!(matches!(
            builder.lookup("fresh").and_then(|d| d.getter()),
            Some(Getter::Uninitialized)
        ));
    }
}

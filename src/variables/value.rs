//! Variable flags, resolved values and indices.

use bitflags::bitflags;
use bytes::Bytes;

bitflags! {
    /// Registration flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VariableFlags: u8 {
        /// Re-registration merges instead of failing.
        const CHANGEABLE  = 0b0000_0001;
        /// Recomputed on every flushed read.
        const NOCACHEABLE = 0b0000_0010;
        /// Has a slot in the indexed table.
        const INDEXED     = 0b0000_0100;
        /// Never looked up by name.
        const NOHASH      = 0b0000_1000;
        /// Placeholder expected to be overridden.
        const WEAK        = 0b0001_0000;
        /// Matched by name prefix.
        const PREFIX      = 0b0010_0000;
    }
}

/// Stable slot handle for a variable within one compiled configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableIndex(pub usize);

impl VariableIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for VariableIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Valid,
    NotFound,
}

/// A resolved variable value.
///
/// A value is either valid (with bytes, possibly empty) or not found; the two
/// states are exclusive. `no_cacheable` values are recomputed by flushed reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableValue {
    data: Bytes,
    state: State,
    no_cacheable: bool,
}

impl VariableValue {
    /// A valid value.
    pub fn valid(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            state: State::Valid,
            no_cacheable: false,
        }
    }

    /// A valid value over static bytes.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::valid(Bytes::from_static(data))
    }

    /// The empty valid value.
    pub fn empty() -> Self {
        Self::valid(Bytes::new())
    }

    /// The absent value.
    pub fn not_found() -> Self {
        Self {
            data: Bytes::new(),
            state: State::NotFound,
            no_cacheable: false,
        }
    }

    /// Mark the value as volatile.
    pub fn with_no_cacheable(mut self, no_cacheable: bool) -> Self {
        self.no_cacheable = no_cacheable;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.state == State::Valid
    }

    pub fn is_not_found(&self) -> bool {
        self.state == State::NotFound
    }

    pub fn is_no_cacheable(&self) -> bool {
        self.no_cacheable
    }

    /// Value bytes; empty when not found.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the value bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// UTF-8 view, lossy.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// The bytes when valid.
    pub fn into_option(self) -> Option<Bytes> {
        match self.state {
            State::Valid => Some(self.data),
            State::NotFound => None,
        }
    }
}

impl Default for VariableValue {
    fn default() -> Self {
        Self::not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_exclusive() {
        let v = VariableValue::valid("x");
        assert!(v.is_valid() && !v.is_not_found());

        let v = VariableValue::not_found();
        assert!(v.is_not_found() && !v.is_valid());
        assert!(v.as_bytes().is_empty());
        assert_eq!(v.into_option(), None);
    }

    #[test]
    fn test_flags_merge_clears_weak() {
        let mut flags = VariableFlags::CHANGEABLE | VariableFlags::WEAK;
        flags &= VariableFlags::CHANGEABLE | !VariableFlags::WEAK;
        assert_eq!(flags, VariableFlags::CHANGEABLE);
    }
}

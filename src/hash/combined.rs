//! Exact + wildcard hash used by map tables.
//!
//! # Responsibilities
//! - Collect keys, classifying them as exact, head wildcard or tail wildcard
//! - Reject duplicate keys at build time
//! - Look up exact first, then the longest head wildcard, then the longest tail wildcard
//!
//! # Design Decisions
//! - `*.example.com` matches subdomains only; `.example.com` also matches the bare name
//! - `www.example.*` matches any final label
//! - Keys are folded to lowercase on insertion; lookups expect a lowercased subject

use std::collections::HashSet;

use crate::hash::table::{hash_key, HashSizing, HashTable};
use crate::variables::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Exact,
    /// Stored as ".example.com"; `bare` also accepts "example.com".
    Head { bare: bool },
    /// Stored as "www.example.".
    Tail,
}

/// Key collection prior to building a `CombinedHash`.
#[derive(Debug)]
pub struct HashKeys<V> {
    exact: Vec<(Vec<u8>, V)>,
    head: Vec<(Vec<u8>, HeadValue<V>)>,
    tail: Vec<(Vec<u8>, V)>,
    seen: HashSet<(Vec<u8>, u8)>,
}

#[derive(Debug, Clone)]
struct HeadValue<V> {
    value: V,
    bare: bool,
}

impl<V> Default for HashKeys<V> {
    fn default() -> Self {
        Self {
            exact: Vec::new(),
            head: Vec::new(),
            tail: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

fn classify(key: &[u8], wildcards: bool) -> Result<(KeyKind, Vec<u8>), ()> {
    if !wildcards {
        return Ok((KeyKind::Exact, key.to_vec()));
    }

    if let Some(rest) = key.strip_prefix(b"*.") {
        if rest.is_empty() || rest.contains(&b'*') {
            return Err(());
        }
        let mut stored = Vec::with_capacity(rest.len() + 1);
        stored.push(b'.');
        stored.extend_from_slice(rest);
        return Ok((KeyKind::Head { bare: false }, stored));
    }

    if key.first() == Some(&b'.') {
        if key.len() == 1 || key.contains(&b'*') {
            return Err(());
        }
        return Ok((KeyKind::Head { bare: true }, key.to_vec()));
    }

    if let Some(rest) = key.strip_suffix(b".*") {
        if rest.is_empty() || rest.contains(&b'*') {
            return Err(());
        }
        let mut stored = rest.to_vec();
        stored.push(b'.');
        return Ok((KeyKind::Tail, stored));
    }

    if key.contains(&b'*') {
        return Err(());
    }
    Ok((KeyKind::Exact, key.to_vec()))
}

impl<V> HashKeys<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; `wildcards` enables `*.`/`.`/`.*` forms.
    pub fn add(&mut self, key: &str, value: V, wildcards: bool) -> Result<(), ConfigError> {
        let lower = key.to_ascii_lowercase().into_bytes();
        let (kind, stored) = classify(&lower, wildcards)
            .map_err(|_| ConfigError::InvalidWildcard(key.to_string()))?;

        let tag = match kind {
            KeyKind::Exact => 0,
            KeyKind::Head { .. } => 1,
            KeyKind::Tail => 2,
        };
        if !self.seen.insert((stored.clone(), tag)) {
            return Err(ConfigError::ConflictingMapKey(key.to_string()));
        }

        match kind {
            KeyKind::Exact => self.exact.push((stored, value)),
            KeyKind::Head { bare } => self.head.push((stored, HeadValue { value, bare })),
            KeyKind::Tail => self.tail.push((stored, value)),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.head.is_empty() && self.tail.is_empty()
    }
}

/// Combined lookup table.
#[derive(Debug, Clone)]
pub struct CombinedHash<V> {
    exact: HashTable<V>,
    head: HashTable<HeadValue<V>>,
    tail: HashTable<V>,
}

impl<V> CombinedHash<V> {
    /// Build the three tables from collected keys.
    pub fn build(name: &str, keys: HashKeys<V>, sizing: HashSizing) -> Result<Self, ConfigError> {
        Ok(Self {
            exact: HashTable::build(name, keys.exact, sizing)?,
            head: HashTable::build(name, keys.head, sizing)?,
            tail: HashTable::build(name, keys.tail, sizing)?,
        })
    }

    /// Look up a lowercased subject; `hash` is `hash_key(subject)`.
    pub fn find(&self, hash: u32, subject: &[u8]) -> Option<&V> {
        if let Some(v) = self.exact.find(hash, subject) {
            return Some(v);
        }

        if !self.head.is_empty() {
            // Leftmost dot first: longest suffix wins.
            for (i, _) in subject.iter().enumerate().filter(|&(_, &c)| c == b'.') {
                let suffix = &subject[i..];
                if let Some(hv) = self.head.find(hash_key(suffix), suffix) {
                    return Some(&hv.value);
                }
            }

            let mut dotted = Vec::with_capacity(subject.len() + 1);
            dotted.push(b'.');
            dotted.extend_from_slice(subject);
            if let Some(hv) = self.head.find(hash_key(&dotted), &dotted) {
                if hv.bare {
                    return Some(&hv.value);
                }
            }
        }

        if !self.tail.is_empty() {
            // Rightmost dot first: longest prefix wins.
            for (i, _) in subject.iter().enumerate().rev().filter(|&(_, &c)| c == b'.') {
                let prefix = &subject[..=i];
                if let Some(v) = self.tail.find(hash_key(prefix), prefix) {
                    return Some(v);
                }
            }
        }

        None
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.head.is_empty() && self.tail.is_empty()
    }
}

impl<V> Default for CombinedHash<V> {
    fn default() -> Self {
        Self {
            exact: HashTable::empty(),
            head: HashTable::empty(),
            tail: HashTable::empty(),
        }
    }
}

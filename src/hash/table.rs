//! Bucketed exact-key hash table built once from a key set.
//!
//! # Responsibilities
//! - Pick the smallest bucket count that keeps every bucket within its byte budget
//! - Answer `find(hash, key)` without allocation
//!
//! # Design Decisions
//! - Sizing mirrors the server's `*_hash_max_size` / `*_hash_bucket_size` knobs:
//!   an entry costs its key length plus a pointer, rounded to pointer size
//! - Failing to fit is a configuration error naming the knob to raise

use crate::variables::ConfigError;

const PTR: usize = std::mem::size_of::<usize>();

/// Hash a byte string (`k = k * 31 + c`).
pub fn hash_key(data: &[u8]) -> u32 {
    data.iter()
        .fold(0u32, |k, &c| k.wrapping_mul(31).wrapping_add(c as u32))
}

/// Hash the lowercase form of a byte string.
pub fn hash_key_lc(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |k, &c| {
        k.wrapping_mul(31).wrapping_add(c.to_ascii_lowercase() as u32)
    })
}

/// Sizing bounds for a table.
#[derive(Debug, Clone, Copy)]
pub struct HashSizing {
    /// Upper bound on the bucket count.
    pub max_size: usize,
    /// Byte budget per bucket.
    pub bucket_size: usize,
}

impl Default for HashSizing {
    fn default() -> Self {
        Self {
            max_size: 512,
            bucket_size: 64,
        }
    }
}

fn elt_size(key_len: usize) -> usize {
    let raw = PTR + key_len + 2;
    raw.div_ceil(PTR) * PTR
}

#[derive(Debug, Clone)]
struct Entry<V> {
    key: Box<[u8]>,
    value: V,
}

/// Immutable exact-key table.
#[derive(Debug, Clone)]
pub struct HashTable<V> {
    buckets: Vec<Vec<Entry<V>>>,
    len: usize,
}

impl<V> HashTable<V> {
    /// An empty table that never matches.
    pub fn empty() -> Self {
        Self {
            buckets: Vec::new(),
            len: 0,
        }
    }

    /// Build a table from `(key, value)` pairs; keys are stored as given.
    pub fn build(
        name: &str,
        keys: Vec<(Vec<u8>, V)>,
        sizing: HashSizing,
    ) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Ok(Self::empty());
        }

        let budget = sizing.bucket_size.saturating_sub(PTR);
        let max_size = sizing.max_size.max(1);

        for (key, _) in &keys {
            if elt_size(key.len()) > budget {
                return Err(ConfigError::HashTooSmall {
                    name: name.to_string(),
                    max_size,
                    bucket_size: sizing.bucket_size,
                });
            }
        }

        let hashes: Vec<u32> = keys.iter().map(|(k, _)| hash_key(k)).collect();
        let start = (keys.len() / (sizing.bucket_size / (2 * PTR)).max(1)).clamp(1, max_size);

        let size = (start..=max_size)
            .find(|&size| {
                let mut used = vec![0usize; size];
                keys.iter().zip(&hashes).all(|((key, _), &h)| {
                    let slot = &mut used[h as usize % size];
                    *slot += elt_size(key.len());
                    *slot <= budget
                })
            })
            .ok_or_else(|| ConfigError::HashTooSmall {
                name: name.to_string(),
                max_size,
                bucket_size: sizing.bucket_size,
            })?;

        tracing::debug!(table = %name, size, entries = keys.len(), "hash table built");

        let mut buckets: Vec<Vec<Entry<V>>> = (0..size).map(|_| Vec::new()).collect();
        let len = keys.len();
        for ((key, value), h) in keys.into_iter().zip(hashes) {
            buckets[h as usize % size].push(Entry {
                key: key.into_boxed_slice(),
                value,
            });
        }

        Ok(Self { buckets, len })
    }

    /// Look up `key` whose hash is `hash`.
    pub fn find(&self, hash: u32, key: &[u8]) -> Option<&V> {
        if self.buckets.is_empty() {
            return None;
        }
        self.buckets[hash as usize % self.buckets.len()]
            .iter()
            .find(|e| &*e.key == key)
            .map(|e| &e.value)
    }

    /// Hash and look up `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.find(hash_key(key), key)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket count chosen by the sizing search.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<(Vec<u8>, usize)> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_bytes().to_vec(), i))
            .collect()
    }

    #[test]
    fn test_build_and_find() {
        let table = HashTable::build(
            "test_hash",
            keys(&["host", "remote_addr", "uri", "args"]),
            HashSizing::default(),
        )
        .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get(b"uri"), Some(&2));
        assert_eq!(table.find(hash_key(b"args"), b"args"), Some(&3));
        assert_eq!(table.get(b"missing"), None);
    }

    #[test]
    fn test_hash_key_lc_matches_lowercase() {
        assert_eq!(hash_key_lc(b"HoSt"), hash_key(b"host"));
    }

    #[test]
    fn test_key_longer_than_bucket_fails() {
        let long = "x".repeat(100);
        let err = HashTable::build(
            "variables_hash",
            keys(&[&long]),
            HashSizing {
                max_size: 16,
                bucket_size: 64,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("variables_hash"));
    }

    #[test]
    fn test_too_many_keys_for_max_size_fails() {
        let names: Vec<String> = (0..64).map(|i| format!("variable_{i}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let result = HashTable::build(
            "variables_hash",
            keys(&refs),
            HashSizing {
                max_size: 2,
                bucket_size: 64,
            },
        );
        assert!(matches!(result, Err(ConfigError::HashTooSmall { .. })));
    }
}

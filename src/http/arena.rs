//! Per-request allocation arena.
//!
//! # Responsibilities
//! - Hand out byte buffers whose lifetime is the request's
//! - Keep small computed values (numbers, joined headers) in shared chunks
//! - Enforce an optional per-request byte cap
//!
//! # Design Decisions
//! - Backed by one growing `BytesMut`; every allocation is split off and frozen,
//!   so values are refcounted views into a shared chunk
//! - Nothing is freed individually; the chunk goes away with its last view
//! - Exceeding the cap is an allocation failure, surfaced as `EvaluationError`

use std::fmt::{self, Write as _};

use bytes::{BufMut, Bytes, BytesMut};

use crate::variables::EvaluationError;

/// Default size of a fresh chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Bump allocator producing refcounted byte views.
#[derive(Debug)]
pub struct Arena {
    buf: BytesMut,
    chunk_size: usize,
    limit: Option<usize>,
    allocated: usize,
}

impl Arena {
    /// Create an arena with the given chunk size and optional byte cap.
    pub fn new(chunk_size: usize, limit: Option<usize>) -> Self {
        let chunk_size = chunk_size.max(64);
        Self {
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
            limit,
            allocated: 0,
        }
    }

    /// Total bytes handed out so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    fn reserve(&mut self, n: usize) -> Result<(), EvaluationError> {
        if let Some(limit) = self.limit {
            if self.allocated + n > limit {
                return Err(EvaluationError::Allocation {
                    requested: n,
                    limit,
                });
            }
        }
        if self.buf.capacity() - self.buf.len() < n {
            // Earlier views keep the old chunk alive; this starts a new one.
            self.buf = BytesMut::with_capacity(n.max(self.chunk_size));
        }
        Ok(())
    }

    fn finish(&mut self) -> Bytes {
        let out = self.buf.split().freeze();
        self.allocated += out.len();
        out
    }

    /// Copy `data` into the arena.
    pub fn copy(&mut self, data: &[u8]) -> Result<Bytes, EvaluationError> {
        self.reserve(data.len())?;
        self.buf.put_slice(data);
        Ok(self.finish())
    }

    /// ASCII-lowercased copy of `data`.
    pub fn lowercase(&mut self, data: &[u8]) -> Result<Bytes, EvaluationError> {
        self.reserve(data.len())?;
        self.buf.extend(data.iter().map(|c| c.to_ascii_lowercase()));
        Ok(self.finish())
    }

    /// Format into the arena.
    pub fn format(&mut self, args: fmt::Arguments<'_>) -> Result<Bytes, EvaluationError> {
        let mut scratch = String::new();
        scratch
            .write_fmt(args)
            .map_err(|_| EvaluationError::Getter("formatting failed".into()))?;
        self.copy(scratch.as_bytes())
    }

    /// Concatenate `parts` separated by `sep`.
    pub fn join<'p, I>(&mut self, parts: I, sep: &[u8]) -> Result<Bytes, EvaluationError>
    where
        I: IntoIterator<Item = &'p [u8]>,
        I::IntoIter: Clone,
    {
        let parts = parts.into_iter();
        let count = parts.clone().count();
        let len: usize =
            parts.clone().map(|p| p.len()).sum::<usize>() + sep.len() * count.saturating_sub(1);

        self.reserve(len)?;
        for (i, part) in parts.enumerate() {
            if i > 0 {
                self.buf.put_slice(sep);
            }
            self.buf.put_slice(part);
        }
        Ok(self.finish())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_new_chunks() {
        let mut arena = Arena::new(64, None);
        let a = arena.copy(b"first").unwrap();
        let big = vec![b'x'; 200];
        let b = arena.copy(&big).unwrap();
        let c = arena.format(format_args!("{}-{}", 7, "z")).unwrap();

        assert_eq!(&a[..], b"first");
        assert_eq!(b.len(), 200);
        assert_eq!(&c[..], b"7-z");
        assert_eq!(arena.allocated(), 5 + 200 + 3);
    }

    #[test]
    fn test_join_and_lowercase() {
        let mut arena = Arena::default();
        let parts: [&[u8]; 3] = [b"a=1", b"b=2", b"c=3"];
        let joined = arena.join(parts.iter().copied(), b"; ").unwrap();
        assert_eq!(&joined[..], b"a=1; b=2; c=3");
        assert_eq!(&arena.lowercase(b"Example.COM").unwrap()[..], b"example.com");
    }

    #[test]
    fn test_limit_is_allocation_failure() {
        let mut arena = Arena::new(64, Some(8));
        assert!(arena.copy(b"12345").is_ok());
        let err = arena.copy(b"6789").unwrap_err();
        assert!(matches!(err, EvaluationError::Allocation { requested: 4, limit: 8 }));
    }
}

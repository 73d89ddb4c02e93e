//! Append-only chunked list.
//!
//! # Responsibilities
//! - Store records in fixed-capacity parts, never moving earlier parts
//! - Preserve insertion order
//! - Yield a finite forward sequence over every record
//!
//! # Design Decisions
//! - A full part is never grown; a new part is chained instead
//! - No removal: callers mark records dead (see `Header::hash`)

/// Ordered, append-only sequence of records stored in fixed-size parts.
#[derive(Debug, Clone)]
pub struct ChunkedList<T> {
    parts: Vec<Vec<T>>,
    part_capacity: usize,
    len: usize,
}

impl<T> ChunkedList<T> {
    /// Create an empty list whose parts hold `part_capacity` records each.
    pub fn new(part_capacity: usize) -> Self {
        Self {
            parts: Vec::new(),
            part_capacity: part_capacity.max(1),
            len: 0,
        }
    }

    /// Append a record, chaining a new part when the last one is full.
    pub fn push(&mut self, item: T) -> &mut T {
        let needs_part = self
            .parts
            .last()
            .map(|p| p.len() == self.part_capacity)
            .unwrap_or(true);

        if needs_part {
            self.parts.push(Vec::with_capacity(self.part_capacity));
        }

        self.len += 1;
        let last = self.parts.len() - 1;
        let part = &mut self.parts[last];
        part.push(item);
        let at = part.len() - 1;
        &mut part[at]
    }

    /// Number of records, dead ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chained parts.
    pub fn parts(&self) -> usize {
        self.parts.len()
    }

    /// Forward iteration across all parts.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.parts.iter().flat_map(|p| p.iter())
    }

    /// Mutable forward iteration across all parts.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.parts.iter_mut().flat_map(|p| p.iter_mut())
    }

    /// Record at a flat position.
    pub fn get(&self, mut pos: usize) -> Option<&T> {
        for part in &self.parts {
            if pos < part.len() {
                return part.get(pos);
            }
            pos -= part.len();
        }
        None
    }
}

impl<T> Default for ChunkedList<T> {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_chains_parts() {
        let mut list = ChunkedList::new(2);
        for i in 0..5 {
            list.push(i);
        }
        assert_eq!(list.len(), 5);
        assert_eq!(list.parts(), 3);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_get_across_parts() {
        let mut list = ChunkedList::new(3);
        for i in 10..17 {
            list.push(i);
        }
        assert_eq!(list.get(0), Some(&10));
        assert_eq!(list.get(4), Some(&14));
        assert_eq!(list.get(6), Some(&16));
        assert_eq!(list.get(7), None);
    }
}

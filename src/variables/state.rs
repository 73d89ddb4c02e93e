//! Per-request evaluation state.
//!
//! One `VariableState` lives inside each request. Slots start unresolved,
//! resolve at most once per evaluation cycle and are discarded with the request.

use bytes::Bytes;

use crate::variables::VariableValue;

/// Slot array plus the shared capture buffer.
#[derive(Debug, Default)]
pub struct VariableState {
    /// `None` is unresolved.
    pub(crate) slots: Vec<Option<VariableValue>>,
    /// Group offsets of the last successful match; group 0 is the whole match.
    pub(crate) captures: Vec<Option<(usize, usize)>>,
    /// Groups reported by the last match.
    pub(crate) ncaptures: usize,
    /// Subject of the last successful match.
    pub(crate) captures_data: Option<Bytes>,
}

impl VariableState {
    /// Size the slot array and the capture buffer for one compiled configuration.
    pub fn prepare(&mut self, slots: usize, max_captures: usize) {
        self.slots.clear();
        self.slots.resize(slots, None);
        self.captures.clear();
        self.captures.resize(max_captures + 1, None);
        self.ncaptures = 0;
        self.captures_data = None;
    }

    pub fn is_prepared_for(&self, slots: usize) -> bool {
        self.slots.len() == slots
    }

    /// Cached value at `index`, if resolved.
    pub fn slot(&self, index: usize) -> Option<&VariableValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Capture group `n` of the last match.
    pub fn capture(&self, n: usize) -> Option<Bytes> {
        if n >= self.ncaptures {
            return None;
        }
        let data = self.captures_data.as_ref()?;
        let (start, end) = (*self.captures.get(n)?)?;
        Some(data.slice(start..end))
    }

    /// Groups recorded by the last match (0 when nothing matched yet).
    pub fn captures_len(&self) -> usize {
        self.ncaptures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_resets_state() {
        let mut state = VariableState::default();
        state.prepare(3, 2);
        state.slots[1] = Some(VariableValue::valid("x"));
        state.captures_data = Some(Bytes::from_static(b"abc"));
        state.ncaptures = 1;

        state.prepare(3, 2);
        assert!(state.slot(1).is_none());
        assert_eq!(state.captures.len(), 3);
        assert_eq!(state.captures_len(), 0);
        assert!(state.capture(0).is_none());
    }

    #[test]
    fn test_capture_slices_subject() {
        let mut state = VariableState::default();
        state.prepare(0, 1);
        state.captures_data = Some(Bytes::from_static(b"2024-05"));
        state.captures[0] = Some((0, 7));
        state.captures[1] = Some((5, 7));
        state.ncaptures = 2;

        assert_eq!(state.capture(1).unwrap(), Bytes::from_static(b"05"));
        assert!(state.capture(2).is_none());
    }
}

//! Per-request evaluation.
//!
//! # Responsibilities
//! - Resolve indexed variables once per request and serve the cache afterwards
//! - Recompute volatile variables on flushed reads
//! - Resolve runtime names through the by-name table and the prefix families
//! - Bound nested evaluation with a recursion budget
//!
//! # Design Decisions
//! - The budget lives in the `Evaluation` value, one per top-level evaluation,
//!   and is decremented around every getter call
//! - Running out of budget is soft: the slot becomes not-found and the caller continues
//! - A getter failure forces the slot to not-found and propagates
//!
//! # Data Flow
//! ```text
//! get_by_name(name) ──► by-name table ──► indexed? ──► get_flushed(index)
//!        │                   │                              │
//!        │                   └─► guarded getter (uncached)  ▼
//!        └─► longest prefix ──► guarded getter        get_by_index(index)
//!                                                           │
//!                                        slot resolved? ◄───┘ no: guarded getter → slot
//! ```

use bytes::Bytes;

use crate::http::{Arena, Request};
use crate::observability::metrics;
use crate::variables::prefix;
use crate::variables::{
    EvaluationError, Getter, VariableFlags, VariableIndex, VariableValue, Variables,
};

/// One evaluation context over a request and a compiled configuration.
pub struct Evaluation<'a> {
    vars: &'a Variables,
    request: &'a mut Request,
    depth: usize,
}

impl std::fmt::Debug for Evaluation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluation")
            .field("slots", &self.vars.len())
            .field("depth", &self.depth)
            .finish()
    }
}

impl<'a> Evaluation<'a> {
    /// Bind `request` to `vars`, sizing its slot array on first use.
    pub fn new(vars: &'a Variables, request: &'a mut Request) -> Self {
        if !request.variables.is_prepared_for(vars.len()) {
            vars.prepare(request);
        }
        Self {
            vars,
            request,
            depth: vars.max_depth(),
        }
    }

    pub fn variables(&self) -> &'a Variables {
        self.vars
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        self.request
    }

    /// The request arena.
    pub fn arena(&mut self) -> &mut Arena {
        &mut self.request.pool
    }

    /// Remaining recursion budget.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Capture group `n` of the last successful regex match.
    pub fn capture(&self, n: usize) -> Option<Bytes> {
        self.request.variables.capture(n)
    }

    /// Resolve an indexed variable, serving the cached slot when resolved.
    pub fn get_by_index(&mut self, index: VariableIndex) -> Result<VariableValue, EvaluationError> {
        let vars = self.vars;
        let i = index.get();
        let desc = vars.indexed.get(i).ok_or(EvaluationError::UnknownIndex(i))?;

        // 1. Cache hit
        if let Some(value) = self.request.variables.slot(i) {
            return Ok(value.clone());
        }

        // 2. Budget-guarded getter call
        let result = match &desc.getter {
            Some(getter) => self.guarded(getter, &desc.name),
            None => Ok(VariableValue::not_found()),
        };

        // 3. Store; failure leaves not-found behind
        let no_cacheable = desc.flags.contains(VariableFlags::NOCACHEABLE);
        match result {
            Ok(value) => {
                let value = value.with_no_cacheable(no_cacheable);
                self.store(i, value.clone());
                Ok(value)
            }
            Err(e) => {
                self.store(i, VariableValue::not_found().with_no_cacheable(no_cacheable));
                Err(e)
            }
        }
    }

    /// Resolve an indexed variable, recomputing volatile values.
    pub fn get_flushed(&mut self, index: VariableIndex) -> Result<VariableValue, EvaluationError> {
        let i = index.get();
        if let Some(value) = self.request.variables.slot(i) {
            if !value.is_no_cacheable() {
                return Ok(value.clone());
            }
            self.request.variables.slots[i] = None;
        }
        self.get_by_index(index)
    }

    /// Resolve a runtime name (case-insensitive).
    ///
    /// Names nobody registered resolve to not-found, never to an error.
    pub fn get_by_name(&mut self, name: &str) -> Result<VariableValue, EvaluationError> {
        let vars = self.vars;
        let lower = name.to_ascii_lowercase();

        if let Some(named) = vars.named.get(lower.as_bytes()) {
            if let Some(index) = named.index {
                return self.get_flushed(index);
            }
            return match &named.getter {
                Some(getter) => Ok(self.guarded(getter, &named.name)?.with_no_cacheable(
                    named.flags.contains(VariableFlags::NOCACHEABLE),
                )),
                None => Ok(VariableValue::not_found()),
            };
        }

        match prefix::longest_match(&vars.prefixes, &lower) {
            Some(p) => match &p.getter {
                Some(getter) => self.guarded(getter, name),
                None => Ok(VariableValue::not_found()),
            },
            None => Ok(VariableValue::not_found()),
        }
    }

    /// Assign an indexed variable: through its setter, or straight into the slot.
    pub fn set_indexed(&mut self, index: VariableIndex, value: Bytes) -> Result<(), EvaluationError> {
        let vars = self.vars;
        let i = index.get();
        let desc = vars.indexed.get(i).ok_or(EvaluationError::UnknownIndex(i))?;

        match &desc.setter {
            Some(setter) => {
                setter.invoke(self, &desc.name, value)?;
                self.request.variables.slots[i] = None;
            }
            None => self.store(i, VariableValue::valid(value)),
        }
        Ok(())
    }

    /// Write a resolved value straight into a slot, bypassing getters.
    pub(crate) fn store(&mut self, i: usize, value: VariableValue) {
        if let Some(slot) = self.request.variables.slots.get_mut(i) {
            *slot = Some(value);
        }
    }

    fn guarded(&mut self, getter: &Getter, name: &str) -> Result<VariableValue, EvaluationError> {
        if self.depth == 0 {
            tracing::error!(variable = %name, "cycle while evaluating variable");
            metrics::record_cycle_detected();
            return Ok(VariableValue::not_found());
        }

        self.depth -= 1;
        let result = getter.invoke(self, name);
        self.depth += 1;

        if let Err(e) = &result {
            tracing::debug!(variable = %name, error = %e, "variable evaluation failed");
            metrics::record_evaluation_error(e.kind());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::variables::{VariableGetter, VariablesBuilder};

    #[derive(Debug, Default)]
    struct Counting(Arc<AtomicUsize>);

    impl VariableGetter for Counting {
        fn get(&self, _: &mut Evaluation<'_>, _: &str) -> Result<VariableValue, EvaluationError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(VariableValue::valid(n.to_string()))
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl VariableGetter for Failing {
        fn get(&self, _: &mut Evaluation<'_>, _: &str) -> Result<VariableValue, EvaluationError> {
            Err(EvaluationError::Getter("boom".into()))
        }
    }

    #[derive(Debug)]
    struct SelfRef(VariableIndex);

    impl VariableGetter for SelfRef {
        fn get(&self, eval: &mut Evaluation<'_>, _: &str) -> Result<VariableValue, EvaluationError> {
            eval.get_by_index(self.0)
        }
    }

    #[test]
    fn test_cached_and_volatile() {
        let cached = Arc::new(AtomicUsize::new(0));
        let volatile = Arc::new(AtomicUsize::new(0));

        let mut builder = VariablesBuilder::default();
        builder
            .register("cached", VariableFlags::empty())
            .unwrap()
            .set_getter(Getter::custom(Counting(cached.clone())));
        builder
            .register("volatile", VariableFlags::NOCACHEABLE)
            .unwrap()
            .set_getter(Getter::custom(Counting(volatile.clone())));
        let c = builder.get_or_assign_index("cached").unwrap();
        let v = builder.get_or_assign_index("volatile").unwrap();
        let vars = builder.finalize().unwrap();

        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);
        for _ in 0..3 {
            eval.get_flushed(c).unwrap();
            eval.get_flushed(v).unwrap();
        }
        assert_eq!(cached.load(Ordering::SeqCst), 1);
        assert_eq!(volatile.load(Ordering::SeqCst), 3);

        // get_by_index never recomputes
        assert_eq!(eval.get_by_index(v).unwrap().as_bytes(), b"3");
    }

    #[test]
    fn test_getter_failure_leaves_not_found() {
        let mut builder = VariablesBuilder::default();
        builder
            .register("broken", VariableFlags::empty())
            .unwrap()
            .set_getter(Getter::custom(Failing));
        let idx = builder.get_or_assign_index("broken").unwrap();
        let vars = builder.finalize().unwrap();

        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);
        assert_eq!(
            eval.get_by_index(idx).unwrap_err(),
            EvaluationError::Getter("boom".into())
        );
        assert!(eval.get_by_index(idx).unwrap().is_not_found());
    }

    #[test]
    fn test_self_reference_hits_budget() {
        let mut builder = VariablesBuilder::default();
        let idx = builder.get_or_assign_index("loop").unwrap();
        builder
            .register("loop", VariableFlags::empty())
            .unwrap()
            .set_getter(Getter::custom(SelfRef(idx)));
        let vars = builder.finalize().unwrap();

        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);
        assert!(eval.get_by_index(idx).unwrap().is_not_found());
        assert_eq!(eval.depth(), vars.max_depth());
    }

    #[test]
    fn test_unknown_index() {
        let vars = VariablesBuilder::default().finalize().unwrap();
        let mut request = Request::default();
        assert_eq!(
            vars.get_by_index(&mut request, VariableIndex(7)).unwrap_err(),
            EvaluationError::UnknownIndex(7)
        );
    }

    #[test]
    fn test_set_indexed_without_setter_stores_value() {
        let mut builder = VariablesBuilder::default();
        let idx = builder.declare_settable("target").unwrap();
        let vars = builder.finalize().unwrap();

        let mut request = Request::default();
        let mut eval = vars.evaluate(&mut request);
        eval.set_indexed(idx, Bytes::from_static(b"value")).unwrap();
        assert_eq!(eval.get_flushed(idx).unwrap().as_bytes(), b"value");
        assert_eq!(eval.get_by_name("TARGET").unwrap().as_bytes(), b"value");
    }

    #[test]
    fn test_unregistered_name_is_not_found() {
        let vars = VariablesBuilder::default().finalize().unwrap();
        let mut request = Request::default();
        assert!(vars
            .get_by_name(&mut request, "nothing_here")
            .unwrap()
            .is_not_found());
    }
}

//! Named-capture binding.
//!
//! # Responsibilities
//! - Compile patterns at configuration time and bind named groups to indexed variables
//! - Track the widest capture count so one offset buffer serves every match
//! - On a match, write captured substrings straight into the bound slots
//!
//! # Data Flow
//! ```text
//! compile_regex("^(?<year>\d{4})-(?<month>\d{2})$")
//!     → register year/month (CHANGEABLE, not-found getter until matched)
//!     → bindings [(1, $year), (2, $month)]
//!
//! exec_regex(re, "2024-05")
//!     → offsets in Request::variables.captures
//!     → slot[$year] = "2024", slot[$month] = "05"
//! ```

use bytes::Bytes;

use crate::observability::metrics;
use crate::regex::engine::{Pattern, RegexPattern};
use crate::variables::{
    ConfigError, Evaluation, EvaluationError, Getter, VariableFlags, VariableIndex,
    VariableValue, VariablesBuilder,
};

/// Outcome of a successful pattern execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexMatch {
    Matched,
    /// No match; not an error.
    Declined,
}

/// A compiled pattern with its capture bindings.
#[derive(Debug)]
pub struct CompiledRegex {
    pattern: Box<dyn Pattern>,
    ncaptures: usize,
    bindings: Vec<(usize, VariableIndex)>,
}

impl CompiledRegex {
    pub fn source(&self) -> &str {
        self.pattern.source()
    }

    /// Capture groups, not counting the whole match.
    pub fn captures_len(&self) -> usize {
        self.ncaptures
    }

    /// `(group, index)` pairs for named groups.
    pub fn bindings(&self) -> &[(usize, VariableIndex)] {
        &self.bindings
    }
}

impl VariablesBuilder {
    /// Compile `source` with the default engine and bind its named groups.
    pub fn compile_regex(
        &mut self,
        source: &str,
        caseless: bool,
    ) -> Result<CompiledRegex, ConfigError> {
        let pattern = RegexPattern::compile(source, caseless)?;
        self.compile_pattern(Box::new(pattern))
    }

    /// Bind the named groups of an already compiled pattern.
    pub fn compile_pattern(
        &mut self,
        pattern: Box<dyn Pattern>,
    ) -> Result<CompiledRegex, ConfigError> {
        let ncaptures = pattern.captures_len();
        self.max_captures = self.max_captures.max(ncaptures);

        let mut bindings = Vec::new();
        for (name, group) in pattern.named_groups() {
            self.register(&name, VariableFlags::CHANGEABLE)?
                .set_getter(Getter::CaptureNotFound);
            let index = self.get_or_assign_index(&name)?;
            bindings.push((group, index));
        }

        tracing::debug!(
            pattern = %pattern.source(),
            captures = ncaptures,
            named = bindings.len(),
            "pattern compiled"
        );

        Ok(CompiledRegex {
            pattern,
            ncaptures,
            bindings,
        })
    }
}

impl Evaluation<'_> {
    /// Run `re` against `subject`, filling bound variables on a match.
    pub fn exec_regex(
        &mut self,
        re: &CompiledRegex,
        subject: &Bytes,
    ) -> Result<RegexMatch, EvaluationError> {
        // The buffer is sized at prepare time; take it out while the engine writes.
        let mut offsets = std::mem::take(&mut self.request_mut().variables.captures);
        if offsets.len() < re.ncaptures + 1 {
            offsets.resize(re.ncaptures + 1, None);
        }
        offsets.iter_mut().for_each(|o| *o = None);

        let result = re.pattern.exec(subject, &mut offsets);

        let outcome = match result {
            Ok(Some(n)) => {
                for &(group, index) in &re.bindings {
                    let value = match offsets.get(group).copied().flatten() {
                        Some((start, end)) => VariableValue::valid(subject.slice(start..end)),
                        None => VariableValue::not_found(),
                    };
                    tracing::debug!(
                        variable = %index,
                        value = %value.to_string_lossy(),
                        "regex capture bound"
                    );
                    self.store(index.get(), value);
                }

                let state = &mut self.request_mut().variables;
                state.ncaptures = n;
                state.captures_data = Some(subject.clone());
                metrics::record_regex_exec("matched");
                Ok(RegexMatch::Matched)
            }
            Ok(None) => {
                for &(_, index) in &re.bindings {
                    self.store(index.get(), VariableValue::not_found());
                }
                metrics::record_regex_exec("declined");
                Ok(RegexMatch::Declined)
            }
            Err(reason) => {
                let subject_text = String::from_utf8_lossy(subject).into_owned();
                tracing::error!(
                    pattern = %re.source(),
                    subject = %subject_text,
                    reason = %reason,
                    "regex exec failed"
                );
                metrics::record_regex_exec("fault");
                metrics::record_evaluation_error("regex_fault");
                Err(EvaluationError::RegexFault {
                    pattern: re.source().to_string(),
                    subject: subject_text,
                    reason,
                })
            }
        };

        self.request_mut().variables.captures = offsets;
        outcome
    }
}

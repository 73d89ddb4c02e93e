//! Getter and setter variants.
//!
//! # Responsibilities
//! - Name every way a variable can be resolved or assigned
//! - Carry each variant's own typed context
//! - Dispatch a call with the evaluation context and the variable name
//!
//! # Design Decisions
//! - Built-in variables are a closed enum with one accessor each
//! - Prefix families receive the full variable name and strip their prefix
//! - Modules outside the core plug in through `VariableGetter` / `VariableSetter`

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::builtins::{self, Builtin, PrefixFamily};
use crate::map::MapVariable;
use crate::variables::{Evaluation, EvaluationError, VariableValue};

/// Extension point for getters defined outside the core table.
pub trait VariableGetter: Send + Sync + fmt::Debug {
    /// Resolve the variable. `name` is the name as requested; indexed reads pass it lowercased.
    fn get(&self, eval: &mut Evaluation<'_>, name: &str) -> Result<VariableValue, EvaluationError>;
}

/// Extension point for setters defined outside the core table.
pub trait VariableSetter: Send + Sync + fmt::Debug {
    fn set(&self, eval: &mut Evaluation<'_>, name: &str, value: Bytes) -> Result<(), EvaluationError>;
}

/// How a variable is resolved.
#[derive(Debug, Clone)]
pub enum Getter {
    /// One of the core variables.
    Builtin(Builtin),
    /// A core prefix family (`http_`, `arg_`, ...).
    Prefix(PrefixFamily),
    /// Placeholder for a regex capture; resolves only through a successful match.
    CaptureNotFound,
    /// A settable variable read before any assignment.
    Uninitialized,
    /// A configuration-driven map.
    Map(Arc<MapVariable>),
    Custom(Arc<dyn VariableGetter>),
}

impl Getter {
    /// Wrap a custom getter.
    pub fn custom<G: VariableGetter + 'static>(getter: G) -> Self {
        Getter::Custom(Arc::new(getter))
    }

    pub(crate) fn invoke(
        &self,
        eval: &mut Evaluation<'_>,
        name: &str,
    ) -> Result<VariableValue, EvaluationError> {
        match self {
            Getter::Builtin(b) => builtins::get(*b, eval),
            Getter::Prefix(family) => builtins::get_prefixed(*family, eval, name),
            Getter::CaptureNotFound => Ok(VariableValue::not_found()),
            Getter::Uninitialized => {
                tracing::warn!(variable = %name, "using uninitialized variable");
                Ok(VariableValue::empty())
            }
            Getter::Map(map) => map.get(eval),
            Getter::Custom(getter) => getter.get(eval, name),
        }
    }
}

/// How a variable is assigned.
#[derive(Debug, Clone)]
pub enum Setter {
    /// Replace the query string.
    Args,
    /// Parse a size and store it as the response rate limit.
    LimitRate,
    Custom(Arc<dyn VariableSetter>),
}

impl Setter {
    pub fn custom<S: VariableSetter + 'static>(setter: S) -> Self {
        Setter::Custom(Arc::new(setter))
    }

    pub(crate) fn invoke(
        &self,
        eval: &mut Evaluation<'_>,
        name: &str,
        value: Bytes,
    ) -> Result<(), EvaluationError> {
        match self {
            Setter::Args => {
                builtins::set_args(eval, value);
                Ok(())
            }
            Setter::LimitRate => {
                builtins::set_limit_rate(eval, value);
                Ok(())
            }
            Setter::Custom(setter) => setter.set(eval, name, value),
        }
    }
}

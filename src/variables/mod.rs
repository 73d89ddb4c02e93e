//! Variable registry and evaluator.
//!
//! # Data Flow
//! ```text
//! Configuration load:
//!     register / register_prefix / get_or_assign_index  (registry.rs)
//!     → finalize: resolve indices, build by-name hash   (compile.rs)
//!     → Variables (immutable, shared)
//!
//! Request:
//!     Evaluation { &Variables, &mut Request, budget }   (evaluator.rs)
//!     → slots in Request::variables                     (state.rs)
//!     → getters (builtins, maps, captures, custom)      (getter.rs)
//! ```
//!
//! # Design Decisions
//! - Registration and evaluation are separate types; the runtime only sees `Variables`
//! - Getters are a closed enum plus a trait object escape hatch
//! - Values are `Bytes` views, valid until the last holder drops

pub mod compile;
pub mod error;
pub mod evaluator;
pub mod getter;
pub(crate) mod prefix;
pub mod registry;
pub mod state;
pub mod value;

pub use compile::{IndexedVariable, Variables, VARIABLES_HASH};
pub use error::{ConfigError, EvaluationError};
pub use evaluator::Evaluation;
pub use getter::{Getter, Setter, VariableGetter, VariableSetter};
pub use registry::{Descriptor, VariablesBuilder, DEFAULT_MAX_DEPTH};
pub use state::VariableState;
pub use value::{VariableFlags, VariableIndex, VariableValue};

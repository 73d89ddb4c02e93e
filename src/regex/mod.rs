//! Regular expressions with named-capture variables.
//!
//! # Data Flow
//! ```text
//! configuration pattern text
//!     → engine.rs (compile: capture count, named groups)
//!     → capture.rs (bind named groups to indexed variables)
//!     → CompiledRegex (shared, immutable)
//!
//! request: Evaluation::exec_regex
//!     → Matched (slots written) | Declined | RegexFault
//! ```

pub mod capture;
pub mod engine;

pub use capture::{CompiledRegex, RegexMatch};
pub use engine::{Offsets, Pattern, RegexPattern};

//! Map variables.
//!
//! # Data Flow
//! ```text
//! [[maps]] config
//!     → variable.rs (source template, values, default; registers the getter)
//!     → table.rs (exact/wildcard hash + ordered regex keys)
//!
//! request: $name
//!     → render source → MapTable::find → value or default → resolve
//! ```

pub mod table;
pub mod variable;

pub use table::{MapBuilder, MapTable};
pub use variable::{define_map, MapValue, MapVariable};

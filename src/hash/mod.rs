//! Hash table primitives.
//!
//! # Data Flow
//! ```text
//! (key, value) pairs collected at configuration time
//!     → table.rs (sizing search, bucketed exact table)
//!     → combined.rs (exact + head/tail wildcard tables for maps)
//!     → immutable, shared by every request
//! ```

pub mod combined;
pub mod table;

pub use combined::{CombinedHash, HashKeys};
pub use table::{hash_key, hash_key_lc, HashSizing, HashTable};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (embedding server)
//!     → ConnectionTracker::track (accepted, handled, active)
//!     → ConnectionGuard::enter (reading / writing)
//!     → $connection, $connections_* variables
//! ```

pub mod connection;

pub use connection::{ConnectionGuard, ConnectionState, ConnectionStats, ConnectionTracker};

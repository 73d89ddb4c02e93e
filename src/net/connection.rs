//! Connection identity and shared connection statistics.
//!
//! # Responsibilities
//! - Number connections serially (`$connection`) and count their requests
//! - Count accepted, handled, active, reading and writing connections
//! - Count requests across all connections
//!
//! # Design Decisions
//! - Counters are plain atomics shared through `Arc`; readers see a consistent-enough snapshot
//! - Lifetimes are tracked with RAII guards so a dropped connection can never leak a count
//! - Waiting is derived: active connections neither reading nor writing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What an active connection is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Reading a request header.
    Reading,
    /// Writing a response.
    Writing,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    handled: AtomicU64,
    requests: AtomicU64,
    active: AtomicU64,
    reading: AtomicU64,
    writing: AtomicU64,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub accepted: u64,
    pub handled: u64,
    pub requests: u64,
    pub active: u64,
    pub reading: u64,
    pub writing: u64,
    pub waiting: u64,
}

/// Shared connection statistics.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counters: Arc<Counters>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection. Returns a guard that decrements `active` on drop.
    pub fn track(&self) -> ConnectionGuard {
        let c = &self.counters;
        let number = c.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        c.handled.fetch_add(1, Ordering::Relaxed);
        c.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            counters: Arc::clone(&self.counters),
            number,
            requests: AtomicU64::new(0),
        }
    }

    /// Record one request on any connection.
    pub fn record_request(&self) {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active_count(&self) -> u64 {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ConnectionStats {
        let c = &self.counters;
        let active = c.active.load(Ordering::SeqCst);
        let reading = c.reading.load(Ordering::SeqCst);
        let writing = c.writing.load(Ordering::SeqCst);
        ConnectionStats {
            accepted: c.accepted.load(Ordering::Relaxed),
            handled: c.handled.load(Ordering::Relaxed),
            requests: c.requests.load(Ordering::Relaxed),
            active,
            reading,
            writing,
            waiting: active.saturating_sub(reading + writing),
        }
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    counters: Arc<Counters>,
    number: u64,
    requests: AtomicU64,
}

impl ConnectionGuard {
    /// Serial number of this connection, starting at 1 per tracker.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Count a new request on this connection; returns its 1-based position.
    pub fn next_request(&self) -> u64 {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Enter `state` until the returned guard drops.
    pub fn enter(&self, state: ConnectionState) -> StateGuard {
        let counters = Arc::clone(&self.counters);
        counter(&counters, state).fetch_add(1, Ordering::SeqCst);
        StateGuard { counters, state }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection = self.number, "connection closed");
    }
}

/// Guard for a reading/writing phase.
#[derive(Debug)]
pub struct StateGuard {
    counters: Arc<Counters>,
    state: ConnectionState,
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        counter(&self.counters, self.state).fetch_sub(1, Ordering::SeqCst);
    }
}

fn counter(counters: &Counters, state: ConnectionState) -> &AtomicU64 {
    match state {
        ConnectionState::Reading => &counters.reading,
        ConnectionState::Writing => &counters.writing,
    }
}

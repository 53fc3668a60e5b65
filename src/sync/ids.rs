//! Unique identifiers for buffers and clients

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Buffer identifier
pub type BufferId = u32;

/// Client identifier, unique for the lifetime of a broker
pub type ClientId = u64;

/// Monotonic buffer id source.
///
/// Each broker owns one, so independent brokers hand out independent ids.
/// Ids start at 1 and are never reused; wraparound is not handled.
#[derive(Debug)]
pub struct IdGenerator {
    counter: AtomicU32,
}

impl IdGenerator {
    /// Create a new generator starting at 1
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(1),
        }
    }

    /// Get the next id
    pub fn next_id(&self) -> BufferId {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call will return
    pub fn peek(&self) -> BufferId {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Client id source
#[derive(Debug)]
pub struct ClientIdGenerator {
    counter: AtomicU64,
}

impl ClientIdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ClientId {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ClientIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//! Connection handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for one realtime connection.
///
/// Correlates a connection's connect and disconnect events. Handles are never
/// reused within a process, so a reconnecting client always gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Monotonic `ConnId` allocator.
#[derive(Debug)]
pub struct ConnIdGen {
    seq: AtomicU64,
}

impl Default for ConnIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnIdGen {
    pub fn new() -> Self {
        Self { seq: AtomicU64::new(1) }
    }

    pub fn next_id(&self) -> ConnId {
        ConnId(self.seq.fetch_add(1, Ordering::Relaxed))
    }
}

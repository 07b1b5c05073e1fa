//! Diagnostic counters reported by the node allocators.
//!
//! Values are for display and logging only. Do NOT use them for allocation
//! decisions.

use std::fmt;

/// Point-in-time snapshot of a [`NodeAllocator`](crate::NodeAllocator).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Nodes ever taken from the backing store. Never decremented.
    pub fresh_nodes: usize,
    /// Released nodes waiting in a recycling pool.
    pub pooled_nodes: usize,
    /// Nodes currently handed out.
    pub live_nodes: usize,
    /// Slots available without touching the backing store again.
    pub capacity: usize,
    /// Bytes of backing memory held.
    pub committed_bytes: usize,
    /// Times an arena discarded its buffer for a larger one.
    pub buffer_replacements: usize,
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fresh={} pooled={} live={} capacity={} committed={}B replacements={}",
            self.fresh_nodes,
            self.pooled_nodes,
            self.live_nodes,
            self.capacity,
            self.committed_bytes,
            self.buffer_replacements,
        )
    }
}

use super::alloc::{AllocError, NodeAllocator};
use super::stats::AllocatorStats;
use crate::list::{Key, List, Node, NodeRef, RELEASED_SENTINEL};

/// Node allocator that keeps released nodes on a LIFO free list.
///
/// Fresh nodes come from a growable slot vector and are never returned to
/// the system while the allocator lives; released nodes are threaded onto
/// the pool through their own `next` links and handed out again first.
pub struct RecyclingAllocator {
    slots: Vec<Node>,
    pool: Option<NodeRef>,
    pooled: usize,
}

impl Default for RecyclingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecyclingAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            pool: None,
            pooled: 0,
        }
    }

    /// Total nodes ever taken from the backing store.
    #[must_use]
    pub fn fresh_nodes(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn pooled_nodes(&self) -> usize {
        self.pooled
    }

    fn grow(&mut self, data: Key, next: Option<NodeRef>) -> Result<NodeRef, AllocError> {
        let slot = self.slots.len();
        let node = NodeRef::from_slot(slot).ok_or_else(|| {
            AllocError::out_of_memory(format!(
                "node handle space exhausted at {slot} slots"
            ))
        })?;
        self.slots.try_reserve(1).map_err(|e| {
            AllocError::out_of_memory(format!("cannot grow node storage past {slot} slots: {e}"))
        })?;
        self.slots.push(Node { data, next });
        Ok(node)
    }
}

impl NodeAllocator for RecyclingAllocator {
    fn acquire(&mut self, data: Key, next: Option<NodeRef>) -> Result<NodeRef, AllocError> {
        let Some(top) = self.pool else {
            return self.grow(data, next);
        };
        let node = &mut self.slots[top.slot()];
        self.pool = node.next;
        self.pooled -= 1;
        node.data = data;
        node.next = next;
        Ok(top)
    }

    fn release(&mut self, list: List) {
        let mut cursor = list.into_head();
        while let Some(current) = cursor {
            let node = &mut self.slots[current.slot()];
            cursor = node.next;
            node.data = RELEASED_SENTINEL;
            node.next = self.pool;
            self.pool = Some(current);
            self.pooled += 1;
        }
    }

    fn nodes(&self) -> &[Node] {
        &self.slots
    }

    fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.slots
    }

    fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            fresh_nodes: self.slots.len(),
            pooled_nodes: self.pooled,
            live_nodes: self.slots.len() - self.pooled,
            capacity: self.slots.capacity(),
            committed_bytes: self.slots.capacity() * std::mem::size_of::<Node>(),
            buffer_replacements: 0,
        }
    }
}

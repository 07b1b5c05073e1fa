use super::alloc::{AllocError, NodeAllocator};
use super::stats::AllocatorStats;
use super::vm::{PlatformVmOps, VmError, VmOps};
use crate::list::{Key, List, Node, NodeRef};
use std::ptr::NonNull;
use tracing::debug;

/// One OS mapping holding `slots` zero-initialised nodes.
struct NodeBuffer {
    base: NonNull<Node>,
    slots: usize,
    mapped: usize,
}

// Safety: NodeBuffer owns its mapping exclusively.
unsafe impl Send for NodeBuffer {}

impl NodeBuffer {
    fn map(slots: usize) -> Result<Self, VmError> {
        let bytes = slots.checked_mul(std::mem::size_of::<Node>()).ok_or_else(|| {
            VmError::InitializationFailed(format!("node buffer size overflow ({slots} slots)"))
        })?;
        let mapped = bytes.next_multiple_of(PlatformVmOps::page_size());

        // Safety: FFI calls to reserve/commit memory.
        let ptr = unsafe {
            let ptr = PlatformVmOps::reserve(mapped)?;
            if let Err(e) = PlatformVmOps::commit(ptr, mapped) {
                drop(PlatformVmOps::release(ptr, mapped));
                return Err(e);
            }
            ptr
        };

        // Fresh pages are zero-filled and the all-zero Node is valid.
        Ok(Self {
            base: ptr.cast(),
            slots,
            mapped,
        })
    }

    fn as_slice(&self) -> &[Node] {
        // Safety: base covers `slots` initialised nodes for the life of self.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), self.slots) }
    }

    fn as_mut_slice(&mut self) -> &mut [Node] {
        // Safety: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.base.as_ptr(), self.slots) }
    }
}

impl Drop for NodeBuffer {
    fn drop(&mut self) {
        // Safety: base/mapped describe the reservation made in `map`.
        drop(unsafe { PlatformVmOps::release(self.base.cast(), self.mapped) });
    }
}

/// A bump allocator over one contiguous node buffer, wiped after each trial.
///
/// The buffer only grows: [`ensure_capacity`](Self::ensure_capacity) swaps
/// in a larger one when asked for more slots than it has, and is a no-op
/// otherwise. Releasing any list resets the whole arena, so at most one
/// arena-backed list may be live at a time.
pub struct ArenaAllocator {
    buffer: Option<NodeBuffer>,
    cursor: usize,
    replacements: usize,
}

impl Default for ArenaAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaAllocator {
    /// An arena with no buffer. Every acquire fails until
    /// [`ensure_capacity`](Self::ensure_capacity) is called.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: None,
            cursor: 0,
            replacements: 0,
        }
    }

    /// Create an arena able to hold `capacity` nodes.
    ///
    /// # Errors
    ///
    /// Returns `AllocError` if the buffer cannot be mapped.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let mut arena = Self::new();
        arena.ensure_capacity(capacity)?;
        Ok(arena)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.slots)
    }

    /// Index of the next free slot.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Make room for at least `capacity` nodes.
    ///
    /// When the current buffer is too small it is unmapped first and a new
    /// zeroed buffer of exactly `capacity` slots takes its place, with the
    /// cursor back at 0. Handles issued from the old buffer are meaningless
    /// afterwards; callers must not hold a live list across this call.
    ///
    /// # Errors
    ///
    /// Returns `AllocError::AllocationFailure` if the new buffer cannot be
    /// mapped. The arena is left empty in that case.
    pub fn ensure_capacity(&mut self, capacity: usize) -> Result<(), AllocError> {
        if self.capacity() >= capacity {
            return Ok(());
        }
        if capacity > NodeRef::MAX_SLOTS {
            return Err(AllocError::out_of_memory(format!(
                "arena of {capacity} nodes exceeds the {} addressable slots",
                NodeRef::MAX_SLOTS
            )));
        }

        let previous = self.capacity();
        // Unmap before mapping so the old and new buffers never coexist.
        self.buffer = None;
        self.cursor = 0;
        self.buffer = Some(NodeBuffer::map(capacity)?);
        self.replacements += 1;

        debug!(previous, capacity, "arena buffer replaced");
        Ok(())
    }

    /// Wipe every slot and rewind the cursor.
    pub fn reset(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.as_mut_slice().fill(Node::default());
        }
        self.cursor = 0;
    }
}

impl NodeAllocator for ArenaAllocator {
    fn acquire(&mut self, data: Key, next: Option<NodeRef>) -> Result<NodeRef, AllocError> {
        let capacity = self.capacity();
        let slot = self.cursor;
        let Some(buffer) = self.buffer.as_mut().filter(|_| slot < capacity) else {
            return Err(AllocError::CapacityExceeded { capacity });
        };
        let node = NodeRef::from_slot(slot).ok_or(AllocError::CapacityExceeded { capacity })?;

        buffer.as_mut_slice()[slot] = Node { data, next };
        self.cursor += 1;
        Ok(node)
    }

    /// The list's topology is ignored: the whole arena is reset.
    fn release(&mut self, list: List) {
        drop(list);
        self.reset();
    }

    fn prepare(&mut self, nodes: usize) -> Result<(), AllocError> {
        self.ensure_capacity(nodes)
    }

    fn nodes(&self) -> &[Node] {
        match self.buffer.as_ref() {
            Some(buffer) => buffer.as_slice(),
            None => &[],
        }
    }

    fn nodes_mut(&mut self) -> &mut [Node] {
        match self.buffer.as_mut() {
            Some(buffer) => buffer.as_mut_slice(),
            None => &mut [],
        }
    }

    fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            fresh_nodes: 0,
            pooled_nodes: 0,
            live_nodes: self.cursor,
            capacity: self.capacity(),
            committed_bytes: self.buffer.as_ref().map_or(0, |b| b.mapped),
            buffer_replacements: self.replacements,
        }
    }
}

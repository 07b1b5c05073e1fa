use std::fmt;

use super::stats::AllocatorStats;
use super::vm::VmError;
use crate::list::{Key, List, Node, NodeRef};

/// Fatal node allocation errors. Either one ends the benchmark run.
#[derive(Debug)]
pub enum AllocError {
    /// The backing store could not supply memory for more nodes.
    AllocationFailure(VmError),
    /// An arena was asked for a node past its capacity.
    CapacityExceeded { capacity: usize },
}

impl AllocError {
    pub(crate) fn out_of_memory(msg: impl Into<String>) -> Self {
        AllocError::AllocationFailure(VmError::OutOfMemory(msg.into()))
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::AllocationFailure(e) => write!(f, "node allocation failed: {e}"),
            AllocError::CapacityExceeded { capacity } => {
                write!(f, "arena capacity of {capacity} nodes exceeded")
            }
        }
    }
}

impl std::error::Error for AllocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocError::AllocationFailure(e) => Some(e),
            AllocError::CapacityExceeded { .. } => None,
        }
    }
}

impl From<VmError> for AllocError {
    fn from(e: VmError) -> Self {
        AllocError::AllocationFailure(e)
    }
}

/// Source and sink of list nodes.
///
/// Every node handed out lives in the allocator's slot storage; the sorter
/// and validator reach it through [`nodes`](Self::nodes) and
/// [`nodes_mut`](Self::nodes_mut). All mutation goes through `&mut self`,
/// so an allocator has exactly one mutator at a time.
pub trait NodeAllocator {
    /// Hand out a node holding `data` and linked to `next`.
    ///
    /// # Errors
    ///
    /// Returns `AllocError` if no node can be provided; the run cannot continue.
    fn acquire(&mut self, data: Key, next: Option<NodeRef>) -> Result<NodeRef, AllocError>;

    /// Take back every node of `list`.
    fn release(&mut self, list: List);

    /// Get ready to serve lists of `nodes` nodes. No-op by default.
    ///
    /// # Errors
    ///
    /// Returns `AllocError` if backing memory cannot be obtained.
    fn prepare(&mut self, nodes: usize) -> Result<(), AllocError> {
        let _ = nodes;
        Ok(())
    }

    fn nodes(&self) -> &[Node];

    fn nodes_mut(&mut self) -> &mut [Node];

    fn stats(&self) -> AllocatorStats;
}

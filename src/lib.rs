//! Linked-list merge sort benchmark.
//!
//! Lists are built from nodes handed out by a [`NodeAllocator`], sorted in
//! place by relinking, validated, and handed back. Two allocators are
//! provided: a recycling free list and a page-mapped arena.

pub mod bench;
pub mod list;

// public module: implementation details stay pub(crate), the allocator
// types are re-exported below
pub mod memory;

pub mod report;

// allocators
pub use memory::alloc::{AllocError, NodeAllocator};
pub use memory::node_arena::ArenaAllocator;
pub use memory::recycling::RecyclingAllocator;

// stats
pub use memory::stats::AllocatorStats;

// errors
pub use memory::vm::VmError;

// lists
pub use list::{
    Key, List, ListShape, Node, NodeRef, SortStats, SortViolation, audit, build,
    build_address_ordered, build_shaped, is_sorted, rerandomize, sort, sort_counted,
};

// benchmark
pub use bench::{
    AllocMode, BenchConfig, BenchError, SizeReport, SweepSummary, run_sweep, run_sweep_with,
};

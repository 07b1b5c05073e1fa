pub(crate) mod alloc;
pub(crate) mod node_arena;
pub(crate) mod recycling;
pub(crate) mod stats;
pub(crate) mod vm;

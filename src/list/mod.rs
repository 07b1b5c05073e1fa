pub(crate) mod builder;
pub(crate) mod node;
pub(crate) mod sort;
pub(crate) mod validate;

pub use builder::{ListShape, build, build_address_ordered, build_shaped, from_values, rerandomize};
pub use node::{Iter, Key, List, Node, NodeRef, RELEASED_SENTINEL};
pub use sort::{SortStats, Tally, sort, sort_counted, sort_with};
pub use validate::{SortViolation, audit, is_sorted};

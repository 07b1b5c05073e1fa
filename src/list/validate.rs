use std::fmt;

use fixedbitset::FixedBitSet;

use super::node::{Key, List, Node};

/// Sorted-output check failures. Reportable, never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortViolation {
    /// The node at `position` has a larger key than its successor.
    OutOfOrder { position: usize, key: Key, next_key: Key },
    /// The list does not hold the number of nodes that went into the sort.
    LengthMismatch { expected: usize, actual: usize },
    /// The node at `position` was already visited earlier in the walk.
    Cycle { position: usize },
}

impl fmt::Display for SortViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortViolation::OutOfOrder {
                position,
                key,
                next_key,
            } => write!(
                f,
                "list not sorted at element {position} ({key} > {next_key})"
            ),
            SortViolation::LengthMismatch { expected, actual } => {
                write!(f, "list should hold {expected} nodes, found {actual}")
            }
            SortViolation::Cycle { position } => {
                write!(f, "list revisits a node at element {position}")
            }
        }
    }
}

impl std::error::Error for SortViolation {}

/// True if no key in `list` exceeds its successor's.
#[must_use]
pub fn is_sorted(nodes: &[Node], list: &List) -> bool {
    list.iter(nodes).map(|node| node.data).is_sorted()
}

/// Walk `list` once, checking order, length and that no node repeats.
///
/// Returns the node count on success.
///
/// # Errors
///
/// Returns the first [`SortViolation`] found along the walk; a length
/// mismatch is only reported for an otherwise well-formed list.
pub fn audit(nodes: &[Node], list: &List, expected_len: usize) -> Result<usize, SortViolation> {
    let mut seen = FixedBitSet::with_capacity(nodes.len());
    let mut previous: Option<Key> = None;
    let mut len = 0;

    let mut cursor = list.head();
    while let Some(current) = cursor {
        let node = &nodes[current.slot()];
        if seen.put(current.slot()) {
            return Err(SortViolation::Cycle { position: len });
        }
        if let Some(key) = previous.filter(|&key| key > node.data) {
            return Err(SortViolation::OutOfOrder {
                position: len - 1,
                key,
                next_key: node.data,
            });
        }
        previous = Some(node.data);
        len += 1;
        cursor = node.next;
    }

    if len == expected_len {
        Ok(len)
    } else {
        Err(SortViolation::LengthMismatch {
            expected: expected_len,
            actual: len,
        })
    }
}

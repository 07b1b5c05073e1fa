use std::num::NonZeroU32;

/// Sort key and payload of a node.
pub type Key = i32;

/// Payload written into every node handed back to a recycling pool, so a
/// node read after release without a fresh acquire stands out.
pub const RELEASED_SENTINEL: Key = -1;

/// Handle to a node slot owned by a [`NodeAllocator`](crate::NodeAllocator).
///
/// Stored as `slot + 1` so `Option<NodeRef>` stays four bytes and an
/// all-zero [`Node`] decodes as "no successor".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeRef(NonZeroU32);

impl NodeRef {
    /// Number of slots addressable by a handle.
    pub const MAX_SLOTS: usize = u32::MAX as usize;

    /// Handle for `slot`, or `None` past [`MAX_SLOTS`](Self::MAX_SLOTS).
    #[inline]
    #[must_use]
    pub fn from_slot(slot: usize) -> Option<Self> {
        let raw = u32::try_from(slot.checked_add(1)?).ok()?;
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    #[must_use]
    pub fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A singly linked list element.
///
/// The all-zero bit pattern is a valid node (`data == 0`, `next == None`),
/// which lets the arena hand out OS-zeroed pages as ready slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Node {
    pub data: Key,
    pub next: Option<NodeRef>,
}

/// Owning handle to a chain of nodes inside one allocator.
///
/// Deliberately neither `Clone` nor `Copy`: sorting or releasing a list
/// consumes the handle, so the nodes can never be reachable from two live
/// lists.
#[derive(Debug, Default)]
#[must_use = "dropping a List leaks its nodes until the allocator is reset"]
pub struct List {
    head: Option<NodeRef>,
}

impl List {
    pub const fn empty() -> Self {
        Self { head: None }
    }

    pub(crate) const fn from_head(head: Option<NodeRef>) -> Self {
        Self { head }
    }

    pub(crate) fn into_head(self) -> Option<NodeRef> {
        self.head
    }

    #[must_use]
    pub fn head(&self) -> Option<NodeRef> {
        self.head
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Walk the list through `nodes`.
    ///
    /// Never terminates on a cyclic chain; use [`audit`](crate::list::audit)
    /// when the topology is in doubt.
    pub fn iter<'a>(&self, nodes: &'a [Node]) -> Iter<'a> {
        Iter {
            nodes,
            cursor: self.head,
        }
    }

    /// Collect the keys in list order.
    #[must_use]
    pub fn values(&self, nodes: &[Node]) -> Vec<Key> {
        self.iter(nodes).map(|node| node.data).collect()
    }
}

/// Borrowing iterator over a list's nodes, from [`List::iter`].
pub struct Iter<'a> {
    nodes: &'a [Node],
    cursor: Option<NodeRef>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.cursor?.slot()];
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layout() {
        assert_eq!(std::mem::size_of::<Option<NodeRef>>(), 4);
        assert_eq!(std::mem::size_of::<Node>(), 8);
    }

    #[test]
    fn test_zeroed_node_is_default() {
        // Safety: Test code. Node is repr(C) over i32 and Option<NonZeroU32>-like.
        let zeroed: Node = unsafe { std::mem::zeroed() };
        assert_eq!(zeroed, Node::default());
        assert!(zeroed.next.is_none());
    }

    #[test]
    fn test_node_ref_slot_round_trip() {
        for slot in [0usize, 1, 17, 1 << 20, NodeRef::MAX_SLOTS - 1] {
            assert_eq!(NodeRef::from_slot(slot).unwrap().slot(), slot);
        }
        assert!(NodeRef::from_slot(NodeRef::MAX_SLOTS).is_none());
        assert!(NodeRef::from_slot(usize::MAX).is_none());
    }

    #[test]
    fn test_list_iter_follows_links() {
        let r = |slot| NodeRef::from_slot(slot);
        // 2 -> 0 -> 1
        let nodes = [
            Node { data: 20, next: r(1) },
            Node { data: 30, next: None },
            Node { data: 10, next: r(0) },
        ];
        let list = List::from_head(r(2));
        assert_eq!(list.values(&nodes), vec![10, 20, 30]);
        assert!(!list.is_empty());
        assert!(List::empty().iter(&nodes).next().is_none());
    }
}

use rand::Rng;

use super::node::{Key, List, Node, NodeRef};
use crate::memory::alloc::{AllocError, NodeAllocator};

/// Key order of a freshly built list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListShape {
    /// Independent uniform keys in `0..=Key::MAX`.
    #[default]
    Random,
    /// `0, 1, .., n-1`.
    Presorted,
    /// `n-1, .., 1, 0`.
    Reversed,
    /// Random keys on nodes linked in ascending slot order, so a walk of the
    /// unsorted list moves forward through memory.
    AddressOrdered,
}

impl ListShape {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            ListShape::Random => "randomly chosen",
            ListShape::Presorted => "presorted",
            ListShape::Reversed => "reverse sorted",
            ListShape::AddressOrdered => "address-ordered, randomly chosen",
        }
    }
}

/// Build a list of `n` random keys, each prepended as it is drawn, so list
/// order is the reverse of draw order.
///
/// # Errors
///
/// Returns `AllocError` from the first acquire that fails.
pub fn build<A, R>(n: usize, alloc: &mut A, rng: &mut R) -> Result<List, AllocError>
where
    A: NodeAllocator + ?Sized,
    R: Rng + ?Sized,
{
    let mut head = None;
    for _ in 0..n {
        head = Some(alloc.acquire(rng.gen_range(0..=Key::MAX), head)?);
    }
    Ok(List::from_head(head))
}

/// Build a list of `n` nodes in the given shape. `rng` is only drawn from
/// for the random-key shapes.
///
/// # Errors
///
/// Returns `AllocError` from the first acquire that fails.
pub fn build_shaped<A, R>(
    shape: ListShape,
    n: usize,
    alloc: &mut A,
    rng: &mut R,
) -> Result<List, AllocError>
where
    A: NodeAllocator + ?Sized,
    R: Rng + ?Sized,
{
    match shape {
        ListShape::Random => build(n, alloc, rng),
        // Prepending walks the keys backwards.
        ListShape::Presorted => prepend_all(alloc, (0..n).rev().map(saturating_key)),
        ListShape::Reversed => prepend_all(alloc, (0..n).map(saturating_key)),
        ListShape::AddressOrdered => build_address_ordered(n, alloc, rng),
    }
}

/// Build a list of `n` random keys whose nodes are linked in ascending slot
/// order, whatever order the allocator hands them out in.
///
/// # Errors
///
/// Returns `AllocError` from the first acquire that fails, or if the handle
/// buffer cannot be allocated.
pub fn build_address_ordered<A, R>(
    n: usize,
    alloc: &mut A,
    rng: &mut R,
) -> Result<List, AllocError>
where
    A: NodeAllocator + ?Sized,
    R: Rng + ?Sized,
{
    let mut handles: Vec<NodeRef> = Vec::new();
    handles.try_reserve_exact(n).map_err(|e| {
        AllocError::out_of_memory(format!("cannot order {n} node handles: {e}"))
    })?;
    for _ in 0..n {
        handles.push(alloc.acquire(0, None)?);
    }
    handles.sort_unstable_by_key(|node| node.slot());

    let nodes = alloc.nodes_mut();
    for pair in handles.windows(2) {
        nodes[pair[0].slot()].next = Some(pair[1]);
    }
    let list = List::from_head(handles.first().copied());
    Ok(rerandomize(nodes, list, rng))
}

/// Give every node of `list` a fresh random key, keeping the links.
pub fn rerandomize<R: Rng + ?Sized>(nodes: &mut [Node], list: List, rng: &mut R) -> List {
    let mut cursor = list.head();
    while let Some(current) = cursor {
        let node = &mut nodes[current.slot()];
        node.data = rng.gen_range(0..=Key::MAX);
        cursor = node.next;
    }
    list
}

/// Build a list holding `values` in the given order.
///
/// # Errors
///
/// Returns `AllocError` from the first acquire that fails.
pub fn from_values<A>(alloc: &mut A, values: &[Key]) -> Result<List, AllocError>
where
    A: NodeAllocator + ?Sized,
{
    prepend_all(alloc, values.iter().rev().copied())
}

fn prepend_all<A, I>(alloc: &mut A, keys: I) -> Result<List, AllocError>
where
    A: NodeAllocator + ?Sized,
    I: IntoIterator<Item = Key>,
{
    let mut head = None;
    for key in keys {
        head = Some(alloc.acquire(key, head)?);
    }
    Ok(List::from_head(head))
}

fn saturating_key(i: usize) -> Key {
    Key::try_from(i).unwrap_or(Key::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::node_arena::ArenaAllocator;
    use crate::memory::recycling::RecyclingAllocator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_build_random_length_and_range() {
        let mut alloc = RecyclingAllocator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let list = build(500, &mut alloc, &mut rng).unwrap();

        let values = list.values(alloc.nodes());
        assert_eq!(values.len(), 500);
        assert!(values.iter().all(|&v| v >= 0));
    }

    #[test]
    fn test_build_is_reproducible_for_a_seed() {
        let mut a = RecyclingAllocator::new();
        let mut b = ArenaAllocator::with_capacity(64).unwrap();

        let la = build(64, &mut a, &mut StdRng::seed_from_u64(99)).unwrap();
        let lb = build(64, &mut b, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(la.values(a.nodes()), lb.values(b.nodes()));
    }

    #[test]
    fn test_build_reverses_draw_order() {
        let mut draws = StdRng::seed_from_u64(5);
        let drawn: Vec<Key> = (0..10).map(|_| draws.gen_range(0..=Key::MAX)).collect();

        let mut alloc = RecyclingAllocator::new();
        let list = build(10, &mut alloc, &mut StdRng::seed_from_u64(5)).unwrap();

        let mut expected = drawn;
        expected.reverse();
        assert_eq!(list.values(alloc.nodes()), expected);
    }

    #[test]
    fn test_build_zero_nodes() {
        let mut alloc = ArenaAllocator::new();
        let list = build(0, &mut alloc, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_build_shaped_orders() {
        let mut alloc = RecyclingAllocator::new();
        let mut rng = StdRng::seed_from_u64(0);

        let up = build_shaped(ListShape::Presorted, 5, &mut alloc, &mut rng).unwrap();
        assert_eq!(up.values(alloc.nodes()), vec![0, 1, 2, 3, 4]);

        let down = build_shaped(ListShape::Reversed, 5, &mut alloc, &mut rng).unwrap();
        assert_eq!(down.values(alloc.nodes()), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_build_propagates_capacity_error() {
        let mut arena = ArenaAllocator::with_capacity(3).unwrap();
        let err = build(4, &mut arena, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, AllocError::CapacityExceeded { capacity: 3 }));
    }

    fn slot_order(nodes: &[Node], list: &List) -> Vec<usize> {
        let mut slots = Vec::new();
        let mut cursor = list.head();
        while let Some(current) = cursor {
            slots.push(current.slot());
            cursor = nodes[current.slot()].next;
        }
        slots
    }

    #[test]
    fn test_build_address_ordered_from_scrambled_pool() {
        let mut alloc = RecyclingAllocator::new();
        let mut rng = StdRng::seed_from_u64(8);

        // Sorting a random list scatters its slots; releasing it leaves the
        // pool in that scattered order.
        let list = build(200, &mut alloc, &mut rng).unwrap();
        let list = crate::list::sort(alloc.nodes_mut(), list);
        alloc.release(list);

        let list = build_shaped(ListShape::AddressOrdered, 200, &mut alloc, &mut rng).unwrap();
        assert_eq!(slot_order(alloc.nodes(), &list), (0..200).collect::<Vec<_>>());
        assert_eq!(alloc.fresh_nodes(), 200);
        assert!(list.values(alloc.nodes()).iter().all(|&v| v >= 0));
    }

    #[test]
    fn test_build_address_ordered_arena_and_empty() {
        let mut arena = ArenaAllocator::with_capacity(50).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let empty = build_address_ordered(0, &mut arena, &mut rng).unwrap();
        assert!(empty.is_empty());

        let list = build_address_ordered(50, &mut arena, &mut rng).unwrap();
        assert_eq!(slot_order(arena.nodes(), &list), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_rerandomize_keeps_links() {
        let mut alloc = RecyclingAllocator::new();
        let list = from_values(&mut alloc, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let before = slot_order(alloc.nodes(), &list);

        let mut rng = StdRng::seed_from_u64(21);
        let list = rerandomize(alloc.nodes_mut(), list, &mut rng);

        assert_eq!(slot_order(alloc.nodes(), &list), before);
        let mut draws = StdRng::seed_from_u64(21);
        let expected: Vec<Key> = (0..8).map(|_| draws.gen_range(0..=Key::MAX)).collect();
        assert_eq!(list.values(alloc.nodes()), expected);
    }

    #[test]
    fn test_from_values_keeps_order() {
        let mut alloc = RecyclingAllocator::new();
        let list = from_values(&mut alloc, &[5, 3, 8]).unwrap();
        assert_eq!(list.values(alloc.nodes()), vec![5, 3, 8]);
    }
}

//! Iterative bottom-up merge sort over linked nodes.
//!
//! The sort never allocates and never copies keys; it only rewrites `next`
//! links. Each pass walks the list once, merging neighbouring runs of up to
//! `k` nodes onto an output chain, then doubles `k`. A pass that merges at
//! most one pair of runs has produced a single sorted run and ends the sort.
//!
//! Ties take the node from the right-hand run, so equal keys may change
//! relative order: the sort is not stable.

use super::node::{List, Node, NodeRef};

/// Hook for counting sort work. `()` counts nothing and compiles away.
pub trait Tally {
    fn pass(&mut self);
    fn merge(&mut self);
    fn comparison(&mut self);
}

impl Tally for () {
    #[inline(always)]
    fn pass(&mut self) {}
    #[inline(always)]
    fn merge(&mut self) {}
    #[inline(always)]
    fn comparison(&mut self) {}
}

/// Work done by one [`sort_counted`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    pub passes: u32,
    /// Run pairs merged, summed over all passes.
    pub merges: u64,
    /// Key comparisons.
    pub comparisons: u64,
}

impl Tally for SortStats {
    #[inline]
    fn pass(&mut self) {
        self.passes += 1;
    }
    #[inline]
    fn merge(&mut self) {
        self.merges += 1;
    }
    #[inline]
    fn comparison(&mut self) {
        self.comparisons += 1;
    }
}

/// Sort `list` ascending by key, relinking nodes in `nodes`.
///
/// Consumes the list; the returned list owns the same nodes. Empty and
/// single-node lists come back untouched.
///
/// # Panics
///
/// Panics if the list references a slot outside `nodes`.
pub fn sort(nodes: &mut [Node], list: List) -> List {
    sort_with(nodes, list, &mut ())
}

/// [`sort`], also reporting passes, merges and comparisons.
pub fn sort_counted(nodes: &mut [Node], list: List) -> (List, SortStats) {
    let mut stats = SortStats::default();
    let sorted = sort_with(nodes, list, &mut stats);
    (sorted, stats)
}

pub fn sort_with<T: Tally + ?Sized>(nodes: &mut [Node], list: List, tally: &mut T) -> List {
    let Some(first) = list.head() else {
        return list;
    };
    if nodes[first.slot()].next.is_none() {
        return list;
    }

    let mut head = list.into_head();
    let mut k: usize = 1;
    loop {
        tally.pass();
        let mut out = Splice::default();
        let mut merges: usize = 0;

        let mut cursor = head;
        while let Some(left) = cursor {
            cursor = merge_runs(nodes, &mut out, left, k, tally);
            merges += 1;
            tally.merge();
        }

        if let Some(tail) = out.tail {
            nodes[tail.slot()].next = None;
        }
        head = out.head;

        if merges <= 1 {
            return List::from_head(head);
        }
        k = k.saturating_mul(2);
    }
}

/// Running output chain of a pass.
#[derive(Default)]
struct Splice {
    head: Option<NodeRef>,
    tail: Option<NodeRef>,
}

impl Splice {
    #[inline]
    fn link(&mut self, nodes: &mut [Node], node: NodeRef) {
        match self.tail {
            Some(tail) => nodes[tail.slot()].next = Some(node),
            None => self.head = Some(node),
        }
    }

    #[inline]
    fn push(&mut self, nodes: &mut [Node], node: NodeRef) {
        self.link(nodes, node);
        self.tail = Some(node);
    }

    /// Splice `start` and up to `len - 1` of its successors in one link.
    /// Returns the node after the appended run.
    fn push_run(&mut self, nodes: &mut [Node], start: NodeRef, len: usize) -> Option<NodeRef> {
        self.link(nodes, start);
        let mut last = start;
        for _ in 1..len {
            match nodes[last.slot()].next {
                Some(next) => last = next,
                None => break,
            }
        }
        self.tail = Some(last);
        nodes[last.slot()].next
    }
}

/// Merge the run starting at `left` with the run that follows it, each at
/// most `k` long, onto `out`. Returns the start of the next run pair.
fn merge_runs<T: Tally + ?Sized>(
    nodes: &mut [Node],
    out: &mut Splice,
    left: NodeRef,
    k: usize,
    tally: &mut T,
) -> Option<NodeRef> {
    let mut left_len = 0;
    let mut right = Some(left);
    while left_len < k {
        let Some(node) = right else { break };
        right = nodes[node.slot()].next;
        left_len += 1;
    }
    let mut right_len = k;
    let mut left = left;

    loop {
        let Some(r) = right.filter(|_| right_len > 0) else {
            // Right run spent or absent; whatever `right` points at now
            // starts the next pair.
            out.push_run(nodes, left, left_len);
            return right;
        };

        tally.comparison();
        if nodes[left.slot()].data < nodes[r.slot()].data {
            out.push(nodes, left);
            left_len -= 1;
            if left_len == 0 {
                return out.push_run(nodes, r, right_len);
            }
            // The left run still has nodes, so its next link is in bounds.
            match nodes[left.slot()].next {
                Some(next) => left = next,
                None => return out.push_run(nodes, r, right_len),
            }
        } else {
            out.push(nodes, r);
            right = nodes[r.slot()].next;
            right_len -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::is_sorted;

    /// Lay `values` out as a list over fresh slots, slot i holding values[i].
    fn slots(values: &[i32]) -> (Vec<Node>, List) {
        let nodes: Vec<Node> = values
            .iter()
            .enumerate()
            .map(|(i, &data)| Node {
                data,
                next: if i + 1 < values.len() { NodeRef::from_slot(i + 1) } else { None },
            })
            .collect();
        let head = if values.is_empty() { None } else { NodeRef::from_slot(0) };
        (nodes, List::from_head(head))
    }

    fn sorted_values(values: &[i32]) -> Vec<i32> {
        let (mut nodes, list) = slots(values);
        let sorted = sort(&mut nodes, list);
        sorted.values(&nodes)
    }

    #[test]
    fn test_sort_mixed_keys() {
        assert_eq!(sorted_values(&[5, 3, 8, 1, 9, 2]), vec![1, 2, 3, 5, 8, 9]);
    }

    #[test]
    fn test_sort_duplicates() {
        assert_eq!(sorted_values(&[3, 3, 2]), vec![2, 3, 3]);
        assert_eq!(sorted_values(&[1, 1, 1, 1]), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_sort_empty() {
        let mut nodes: Vec<Node> = Vec::new();
        let sorted = sort(&mut nodes, List::empty());
        assert!(sorted.is_empty());
        assert!(is_sorted(&nodes, &sorted));
    }

    #[test]
    fn test_sort_single_node_untouched() {
        let (mut nodes, list) = slots(&[42]);
        let before = nodes.clone();
        let head = list.head();

        let (sorted, stats) = sort_counted(&mut nodes, list);
        assert_eq!(sorted.head(), head);
        assert_eq!(nodes, before);
        assert_eq!(stats, SortStats::default());
    }

    #[test]
    fn test_sort_two_nodes() {
        assert_eq!(sorted_values(&[2, 1]), vec![1, 2]);
        assert_eq!(sorted_values(&[1, 2]), vec![1, 2]);
    }

    #[test]
    fn test_sort_odd_lengths_and_tails() {
        // Lengths around powers of two exercise short and missing right runs.
        for len in [3usize, 5, 7, 9, 15, 16, 17, 31, 33, 100] {
            let values: Vec<i32> = (0..len as i32).map(|v| (v * 7919) % 101).collect();
            let mut expected = values.clone();
            expected.sort_unstable();
            assert_eq!(sorted_values(&values), expected, "len {len}");
        }
    }

    #[test]
    fn test_sort_reversed_and_presorted() {
        let reversed: Vec<i32> = (0..64).rev().collect();
        let presorted: Vec<i32> = (0..64).collect();
        assert_eq!(sorted_values(&reversed), presorted);
        assert_eq!(sorted_values(&presorted), presorted);
    }

    #[test]
    fn test_sort_extreme_keys() {
        assert_eq!(
            sorted_values(&[i32::MAX, 0, i32::MIN, -1, 1]),
            vec![i32::MIN, -1, 0, 1, i32::MAX]
        );
    }

    #[test]
    fn test_sort_idempotent() {
        let (mut nodes, list) = slots(&[9, 4, 4, 7, 0, 12, 3]);
        let once = sort(&mut nodes, list);
        let first = once.values(&nodes);
        let twice = sort(&mut nodes, once);
        assert_eq!(twice.values(&nodes), first);
    }

    #[test]
    fn test_sort_ties_prefer_right_run() {
        // Slots 0 and 1 carry equal keys; the first merge takes the right
        // run's node (slot 1) before the left run's node (slot 0).
        let (mut nodes, list) = slots(&[5, 5]);
        let sorted = sort(&mut nodes, list);
        let order: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = sorted.head();
            while let Some(r) = cursor {
                out.push(r.slot());
                cursor = nodes[r.slot()].next;
            }
            out
        };
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_sort_counted_passes() {
        let values: Vec<i32> = (0..8).rev().collect();
        let (mut nodes, list) = slots(&values);
        let (sorted, stats) = sort_counted(&mut nodes, list);

        assert_eq!(sorted.values(&nodes), (0..8).collect::<Vec<_>>());
        // k = 1, 2, 4: 4 + 2 + 1 merges.
        assert_eq!(stats.passes, 3);
        assert_eq!(stats.merges, 7);
        // Strictly descending input: every merge drains the right run first,
        // costing exactly k comparisons per pair.
        assert_eq!(stats.comparisons, 4 + 2 * 2 + 4);
    }

    #[test]
    fn test_sort_counted_matches_plain_sort() {
        let values: Vec<i32> = (0..257).map(|v| (v * 31 + 7) % 97).collect();
        let (mut a, list_a) = slots(&values);
        let (mut b, list_b) = slots(&values);

        let plain = sort(&mut a, list_a);
        let (counted, stats) = sort_counted(&mut b, list_b);

        assert_eq!(plain.values(&a), counted.values(&b));
        assert_eq!(stats.passes, 9);
        assert!(stats.comparisons > 0);
    }
}

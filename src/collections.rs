//! Small shared collection helpers used by both [`crate::contraction`] and
//! [`crate::query`]: a decrease-key priority queue built on a reverse-ordered
//! `BinaryHeap`, in the same spirit as the `MinScored` wrapper used
//! throughout the reference Dijkstra, but supporting repeated key-priority
//! updates via the push-duplicate/skip-stale idiom.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;

/// A `(priority, tie_break, key)` triple compared in reverse priority order
/// so that `BinaryHeap`, a max-heap, behaves as a min-heap over `priority`.
/// Ties break on `tie_break` (ascending), then arbitrarily on `key`.
#[derive(Copy, Clone, Eq, PartialEq)]
struct Entry<K> {
    priority: i64,
    tie_break: i64,
    key: K,
}

impl<K: Eq> Ord for Entry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.tie_break.cmp(&self.tie_break))
    }
}

impl<K: Eq> PartialOrd for Entry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-priority queue over keys `K` supporting `decrease_key`. Stale heap
/// entries (superseded by a later, lower-priority push for the same key)
/// are skipped lazily on `pop`, rather than removed eagerly — the standard
/// trick for decrease-key on a `BinaryHeap` that has no native support for
/// it.
pub struct PriorityQueue<K> {
    heap: BinaryHeap<Entry<K>>,
    current: HashMap<K, i64>,
}

impl<K: Copy + Eq + std::hash::Hash> PriorityQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            current: HashMap::new(),
        }
    }

    /// Inserts `key` at `priority`, or lowers its priority if already
    /// present with a higher one. A push that would raise an existing
    /// key's priority is ignored.
    pub fn push_or_decrease(&mut self, key: K, priority: i64, tie_break: i64) {
        let should_insert = match self.current.get(&key) {
            Some(&existing) => priority < existing,
            None => true,
        };
        if should_insert {
            self.current.insert(key, priority);
            self.heap.push(Entry {
                priority,
                tie_break,
                key,
            });
        }
    }

    /// Pops the key with the smallest current priority, skipping any stale
    /// entries left behind by earlier `push_or_decrease` calls.
    pub fn pop(&mut self) -> Option<(K, i64)> {
        while let Some(entry) = self.heap.pop() {
            if self.current.get(&entry.key) == Some(&entry.priority) {
                self.current.remove(&entry.key);
                return Some((entry.key, entry.priority));
            }
        }
        None
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }
}

impl<K: Copy + Eq + std::hash::Hash> Default for PriorityQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_ascending_priority_order() {
        let mut queue = PriorityQueue::new();
        queue.push_or_decrease(1u32, 10, 0);
        queue.push_or_decrease(2u32, 5, 0);
        queue.push_or_decrease(3u32, 7, 0);
        assert_eq!(queue.pop(), Some((2, 5)));
        assert_eq!(queue.pop(), Some((3, 7)));
        assert_eq!(queue.pop(), Some((1, 10)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn decrease_key_supersedes_stale_entry() {
        let mut queue = PriorityQueue::new();
        queue.push_or_decrease(1u32, 10, 0);
        queue.push_or_decrease(1u32, 3, 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some((1, 3)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn raising_priority_is_ignored() {
        let mut queue = PriorityQueue::new();
        queue.push_or_decrease(1u32, 3, 0);
        queue.push_or_decrease(1u32, 10, 0);
        assert_eq!(queue.pop(), Some((1, 3)));
    }

    #[test]
    fn ties_break_on_tie_break_value() {
        let mut queue = PriorityQueue::new();
        queue.push_or_decrease(1u32, 5, 2);
        queue.push_or_decrease(2u32, 5, 1);
        assert_eq!(queue.pop(), Some((2, 5)));
        assert_eq!(queue.pop(), Some((1, 5)));
    }
}

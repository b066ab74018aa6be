// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Expiry Scheduling

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::types::Tick;

/// Time-ordered queue of `(due, key)` pairs.
///
/// Keys are never removed early: when a session finishes before its deadline
/// the stale entry simply pops later and the owner ignores it, so resolution
/// stays idempotent without any bookkeeping here.
#[derive(Debug, Clone)]
pub struct ExpiryQueue<K: Ord> {
    heap: BinaryHeap<Reverse<(Tick, K)>>,
}

impl<K: Ord> Default for ExpiryQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> ExpiryQueue<K> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    pub fn schedule(&mut self, due: Tick, key: K) {
        self.heap.push(Reverse((due, key)));
    }

    /// Pop every key whose deadline is at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Tick) -> Vec<K> {
        let mut due = Vec::new();
        while let Some(Reverse((at, _))) = self.heap.peek() {
            if *at > now {
                break;
            }
            if let Some(Reverse((_, key))) = self.heap.pop() {
                due.push(key);
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<Tick> {
        self.heap.peek().map(|Reverse((at, _))| *at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_deadline_order() {
        let mut q = ExpiryQueue::new();
        q.schedule(30, 'c');
        q.schedule(10, 'a');
        q.schedule(20, 'b');
        assert_eq!(q.next_due(), Some(10));
        assert_eq!(q.pop_due(25), vec!['a', 'b']);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(29), Vec::<char>::new());
        assert_eq!(q.pop_due(30), vec!['c']);
        assert!(q.is_empty());
    }

    #[test]
    fn same_deadline_pops_by_key() {
        let mut q = ExpiryQueue::new();
        q.schedule(5, 2u64);
        q.schedule(5, 1u64);
        assert_eq!(q.pop_due(5), vec![1, 2]);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - History Ledger

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::HistoryEntry;

/// Bounded, append-only record of resolved allocations.
///
/// Holds at most `capacity` entries; on overflow the oldest is evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLedger {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The last `count` entries, oldest first.
    pub fn recent_entries(&self, count: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, ParticipantId, ResolutionMethod};

    fn entry(n: u64) -> HistoryEntry {
        HistoryEntry {
            recipient: ParticipantId::from("a"),
            item: ItemId(format!("item-{n}")),
            amount: 1,
            method: ResolutionMethod::RoundRobin,
            recorded_at: n,
        }
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut ledger = HistoryLedger::new(3);
        for n in 0..7 {
            ledger.record(entry(n));
            assert!(ledger.len() <= 3);
        }
        let ticks: Vec<u64> = ledger.recent_entries(3).iter().map(|e| e.recorded_at).collect();
        assert_eq!(ticks, vec![4, 5, 6]);
    }

    #[test]
    fn recent_entries_is_chronological_suffix() {
        let mut ledger = HistoryLedger::new(10);
        for n in 0..5 {
            ledger.record(entry(n));
        }
        let ticks: Vec<u64> = ledger.recent_entries(2).iter().map(|e| e.recorded_at).collect();
        assert_eq!(ticks, vec![3, 4]);
        assert_eq!(ledger.recent_entries(50).len(), 5);
        assert!(ledger.recent_entries(0).is_empty());
    }

    #[test]
    fn zero_capacity_bumped_to_one() {
        let mut ledger = HistoryLedger::new(0);
        ledger.record(entry(1));
        ledger.record(entry(2));
        assert_eq!(ledger.capacity(), 1);
        assert_eq!(ledger.recent_entries(1)[0].recorded_at, 2);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - External Collaborator Interfaces

use serde::{Deserialize, Serialize};

use crate::types::{Grant, GrantId, ItemId, LootEvent, ParticipantId};

/// Party membership as seen by the session authority.
pub trait RosterProvider {
    /// Members in roster order.
    fn current_members(&self) -> Vec<ParticipantId>;
    fn current_leader(&self) -> Option<ParticipantId>;
}

/// Per-participant inventory storage. Debits return `false` and change
/// nothing when the participant cannot cover the amount.
pub trait Inventory {
    fn credit(&mut self, who: &ParticipantId, item: &ItemId, amount: u32);
    fn debit(&mut self, who: &ParticipantId, item: &ItemId, amount: u32) -> bool;
    fn credit_gold(&mut self, who: &ParticipantId, amount: u64);
    fn debit_gold(&mut self, who: &ParticipantId, amount: u64) -> bool;
}

/// Places grants in the shared world.
pub trait WorldSpawner {
    fn spawn_grant(&mut self, grant: &Grant) -> GrantId;
}

pub trait EventSink {
    fn emit(&mut self, event: LootEvent);
}

/// Everything the coordinator talks to, in one bound.
pub trait Host: RosterProvider + Inventory + WorldSpawner + EventSink {}

impl<T: RosterProvider + Inventory + WorldSpawner + EventSink> Host for T {}

/// Roster read once and frozen for the lifetime of whatever captured it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub members: Vec<ParticipantId>,
    pub leader: Option<ParticipantId>,
}

impl RosterSnapshot {
    pub fn capture(roster: &impl RosterProvider) -> Self {
        Self {
            members: roster.current_members(),
            leader: roster.current_leader(),
        }
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    pub fn is_leader(&self, participant: &ParticipantId) -> bool {
        self.leader.as_ref() == Some(participant)
    }

    /// The leader, only if it is still a member.
    pub fn resolved_leader(&self) -> Option<&ParticipantId> {
        self.leader.as_ref().filter(|l| self.members.contains(l))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - In-Memory Host

//! Self-contained implementation of every collaborator trait. Backs the
//! WASM binding, the bench runner and the tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::collaborators::{EventSink, Inventory, RosterProvider, WorldSpawner};
use crate::types::{Grant, GrantId, ItemId, LootEvent, ParticipantId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub items: HashMap<ItemId, u32>,
    pub gold: u64,
}

impl Wallet {
    pub fn count(&self, item: &ItemId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    members: Vec<ParticipantId>,
    leader: Option<ParticipantId>,
    wallets: HashMap<ParticipantId, Wallet>,
    world: Vec<(GrantId, Grant)>,
    next_grant_id: u64,
    events: Vec<LootEvent>,
}

impl MemoryHost {
    /// Party with `members` in order; the first one leads.
    pub fn with_party<I, P>(members: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        let members: Vec<ParticipantId> = members.into_iter().map(Into::into).collect();
        Self {
            leader: members.first().cloned(),
            members,
            ..Self::default()
        }
    }

    pub fn join(&mut self, participant: impl Into<ParticipantId>) {
        let participant = participant.into();
        if !self.members.contains(&participant) {
            self.members.push(participant);
        }
    }

    pub fn leave(&mut self, participant: &ParticipantId) {
        self.members.retain(|m| m != participant);
        if self.leader.as_ref() == Some(participant) {
            self.leader = None;
        }
    }

    pub fn set_leader(&mut self, leader: Option<ParticipantId>) {
        self.leader = leader;
    }

    pub fn wallet(&self, who: &ParticipantId) -> Wallet {
        self.wallets.get(who).cloned().unwrap_or_default()
    }

    pub fn item_count(&self, who: &ParticipantId, item: &ItemId) -> u32 {
        self.wallets.get(who).map(|w| w.count(item)).unwrap_or(0)
    }

    pub fn gold(&self, who: &ParticipantId) -> u64 {
        self.wallets.get(who).map(|w| w.gold).unwrap_or(0)
    }

    /// Total units of `item` across every wallet.
    pub fn total_items(&self, item: &ItemId) -> u64 {
        self.wallets.values().map(|w| w.count(item) as u64).sum()
    }

    pub fn total_gold(&self) -> u64 {
        self.wallets.values().map(|w| w.gold).sum()
    }

    pub fn world_grants(&self) -> &[(GrantId, Grant)] {
        &self.world
    }

    /// Grants of `item` spawned locked to `who`.
    pub fn owned_grants(&self, who: &ParticipantId, item: &ItemId) -> usize {
        self.world
            .iter()
            .filter(|(_, g)| g.owner.as_ref() == Some(who) && &g.item == item)
            .count()
    }

    pub fn events(&self) -> &[LootEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LootEvent> {
        std::mem::take(&mut self.events)
    }
}

impl RosterProvider for MemoryHost {
    fn current_members(&self) -> Vec<ParticipantId> {
        self.members.clone()
    }

    fn current_leader(&self) -> Option<ParticipantId> {
        self.leader.clone()
    }
}

impl Inventory for MemoryHost {
    fn credit(&mut self, who: &ParticipantId, item: &ItemId, amount: u32) {
        let wallet = self.wallets.entry(who.clone()).or_default();
        let held = wallet.items.entry(item.clone()).or_insert(0);
        *held = held.saturating_add(amount);
    }

    fn debit(&mut self, who: &ParticipantId, item: &ItemId, amount: u32) -> bool {
        let Some(held) = self.wallets.get_mut(who).and_then(|w| w.items.get_mut(item)) else {
            return amount == 0;
        };
        if *held < amount {
            return false;
        }
        *held -= amount;
        if *held == 0 {
            if let Some(wallet) = self.wallets.get_mut(who) {
                wallet.items.remove(item);
            }
        }
        true
    }

    fn credit_gold(&mut self, who: &ParticipantId, amount: u64) {
        let wallet = self.wallets.entry(who.clone()).or_default();
        wallet.gold = wallet.gold.saturating_add(amount);
    }

    fn debit_gold(&mut self, who: &ParticipantId, amount: u64) -> bool {
        let Some(wallet) = self.wallets.get_mut(who) else {
            return amount == 0;
        };
        if wallet.gold < amount {
            return false;
        }
        wallet.gold -= amount;
        true
    }
}

impl WorldSpawner for MemoryHost {
    fn spawn_grant(&mut self, grant: &Grant) -> GrantId {
        self.next_grant_id += 1;
        let id = GrantId(self.next_grant_id);
        self.world.push((id, grant.clone()));
        id
    }
}

impl EventSink for MemoryHost {
    fn emit(&mut self, event: LootEvent) {
        self.events.push(event);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Trade Negotiator
//
// Two-party exchange with mutual, revocable consent:
//
//   Pending --accept--> Active --both confirm--> Completed
//      |                  |
//      +--decline/expire--+--cancel / insufficient assets--> Cancelled
//
// Any change to either offer clears both confirmations. Terminal sessions
// are removed from the registry immediately.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::collaborators::Inventory;
use crate::error::LootError;
use crate::schedule::ExpiryQueue;
use crate::types::{ItemId, ParticipantId, Tick, TradeCancelReason, TradeId};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeState {
    Pending,
    Active,
    Cancelled,
    Completed,
}

impl TradeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedItem {
    pub item: ItemId,
    pub amount: u32,
}

/// One side's staged goods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub items: Vec<StagedItem>,
    pub gold: u64,
}

impl TradeOffer {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.gold == 0
    }

    /// Total staged units of `item` across every staging action.
    pub fn quantity_of(&self, item: &ItemId) -> u64 {
        self.items.iter().filter(|s| &s.item == item).map(|s| s.amount as u64).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSession {
    pub id: TradeId,
    pub initiator: ParticipantId,
    pub target: ParticipantId,
    pub initiator_offer: TradeOffer,
    pub target_offer: TradeOffer,
    pub initiator_confirmed: bool,
    pub target_confirmed: bool,
    pub state: TradeState,
    pub opened_at: Tick,
}

impl TradeSession {
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.initiator == participant || &self.target == participant
    }

    pub fn counterparty(&self, participant: &ParticipantId) -> Option<&ParticipantId> {
        if &self.initiator == participant {
            Some(&self.target)
        } else if &self.target == participant {
            Some(&self.initiator)
        } else {
            None
        }
    }

    pub fn offer_of(&self, participant: &ParticipantId) -> Option<&TradeOffer> {
        if &self.initiator == participant {
            Some(&self.initiator_offer)
        } else if &self.target == participant {
            Some(&self.target_offer)
        } else {
            None
        }
    }

    pub fn is_confirmed_by(&self, participant: &ParticipantId) -> bool {
        if &self.initiator == participant {
            self.initiator_confirmed
        } else if &self.target == participant {
            self.target_confirmed
        } else {
            false
        }
    }

    fn offer_mut(&mut self, participant: &ParticipantId) -> Option<&mut TradeOffer> {
        if &self.initiator == participant {
            Some(&mut self.initiator_offer)
        } else if &self.target == participant {
            Some(&mut self.target_offer)
        } else {
            None
        }
    }

    fn clear_confirmations(&mut self) {
        self.initiator_confirmed = false;
        self.target_confirmed = false;
    }
}

/// What one side receives from a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub trade_id: TradeId,
    pub initiator: ParticipantId,
    pub target: ParticipantId,
    /// Goods that moved from initiator to target.
    pub to_target: TradeOffer,
    /// Goods that moved from target to initiator.
    pub to_initiator: TradeOffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmOutcome {
    /// Recorded; waiting for the other side.
    Waiting,
    Completed(TradeReceipt),
    /// Both confirmed but the exchange could not be applied; nothing moved.
    Aborted(TradeCancelReason),
}

/// A cancelled session, handed back so the caller can notify observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeClosure {
    pub trade_id: TradeId,
    pub reason: TradeCancelReason,
}

// ---------------------------------------------------------------------------
// Negotiator (session registry)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TradeNegotiator {
    sessions: HashMap<TradeId, TradeSession>,
    open_by_participant: HashMap<ParticipantId, TradeId>,
    request_expiries: ExpiryQueue<TradeId>,
    request_timeout_ticks: Tick,
    next_trade_id: u64,
}

impl TradeNegotiator {
    pub fn new(request_timeout_ticks: Tick) -> Self {
        Self {
            sessions: HashMap::new(),
            open_by_participant: HashMap::new(),
            request_expiries: ExpiryQueue::new(),
            request_timeout_ticks: request_timeout_ticks.max(1),
            next_trade_id: 0,
        }
    }

    pub fn initiate(
        &mut self,
        initiator: &ParticipantId,
        target: &ParticipantId,
        now: Tick,
    ) -> Result<TradeId, LootError> {
        if initiator == target {
            return Err(LootError::SelfTrade(initiator.clone()));
        }
        if self.open_by_participant.contains_key(initiator) {
            return Err(LootError::TradeAlreadyOpen(initiator.clone()));
        }
        if self.open_by_participant.contains_key(target) {
            return Err(LootError::TargetBusy(target.clone()));
        }

        self.next_trade_id += 1;
        let id = TradeId(self.next_trade_id);
        self.sessions.insert(id, TradeSession {
            id,
            initiator: initiator.clone(),
            target: target.clone(),
            initiator_offer: TradeOffer::default(),
            target_offer: TradeOffer::default(),
            initiator_confirmed: false,
            target_confirmed: false,
            state: TradeState::Pending,
            opened_at: now,
        });
        self.open_by_participant.insert(initiator.clone(), id);
        self.open_by_participant.insert(target.clone(), id);
        self.request_expiries.schedule(now.saturating_add(self.request_timeout_ticks), id);
        info!(trade = %id, %initiator, %target, "trade requested");
        Ok(id)
    }

    pub fn accept(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<(), LootError> {
        let session = self.pending_for_target(trade_id, participant)?;
        session.state = TradeState::Active;
        info!(trade = %trade_id, "trade accepted");
        Ok(())
    }

    pub fn decline(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<TradeClosure, LootError> {
        self.pending_for_target(trade_id, participant)?;
        Ok(self.close(trade_id, TradeCancelReason::Declined))
    }

    pub fn stage_item(
        &mut self,
        trade_id: TradeId,
        participant: &ParticipantId,
        item: ItemId,
        amount: u32,
    ) -> Result<(), LootError> {
        if amount == 0 {
            return Err(LootError::ZeroAmount);
        }
        let session = self.active_for(trade_id, participant)?;
        let offer = session.offer_mut(participant).ok_or(LootError::NotTradeParticipant {
            trade: trade_id,
            participant: participant.clone(),
        })?;
        // Inventories count items in u32; a larger staged total could never be delivered.
        if offer.quantity_of(&item) + amount as u64 > u32::MAX as u64 {
            return Err(LootError::AmountOverflow);
        }
        debug!(trade = %trade_id, %participant, %item, amount, "item staged");
        offer.items.push(StagedItem { item, amount });
        session.clear_confirmations();
        Ok(())
    }

    pub fn stage_gold(&mut self, trade_id: TradeId, participant: &ParticipantId, amount: u64) -> Result<(), LootError> {
        if amount == 0 {
            return Err(LootError::ZeroAmount);
        }
        let session = self.active_for(trade_id, participant)?;
        let offer = session.offer_mut(participant).ok_or(LootError::NotTradeParticipant {
            trade: trade_id,
            participant: participant.clone(),
        })?;
        offer.gold = offer.gold.checked_add(amount).ok_or(LootError::AmountOverflow)?;
        debug!(trade = %trade_id, %participant, amount, "gold staged");
        session.clear_confirmations();
        Ok(())
    }

    /// Set `participant`'s confirmation. The second confirmation executes
    /// the exchange against `inventory` and closes the session either way.
    pub fn confirm(
        &mut self,
        trade_id: TradeId,
        participant: &ParticipantId,
        inventory: &mut impl Inventory,
    ) -> Result<ConfirmOutcome, LootError> {
        let session = self.active_for(trade_id, participant)?;
        if session.initiator_offer.is_empty() && session.target_offer.is_empty() {
            return Err(LootError::NothingStaged(trade_id));
        }
        if session.is_confirmed_by(participant) {
            return Err(LootError::AlreadyConfirmed { trade: trade_id, participant: participant.clone() });
        }
        if &session.initiator == participant {
            session.initiator_confirmed = true;
        } else {
            session.target_confirmed = true;
        }
        if !(session.initiator_confirmed && session.target_confirmed) {
            debug!(trade = %trade_id, %participant, "trade confirmed by one side");
            return Ok(ConfirmOutcome::Waiting);
        }

        match execute_exchange(session, inventory) {
            Ok(()) => {
                let receipt = TradeReceipt {
                    trade_id,
                    initiator: session.initiator.clone(),
                    target: session.target.clone(),
                    to_target: session.initiator_offer.clone(),
                    to_initiator: session.target_offer.clone(),
                };
                session.state = TradeState::Completed;
                self.remove(trade_id);
                info!(trade = %trade_id, "trade completed");
                Ok(ConfirmOutcome::Completed(receipt))
            }
            Err(short) => {
                warn!(trade = %trade_id, participant = %short, "trade aborted: insufficient assets");
                let closure = self.close(trade_id, TradeCancelReason::InsufficientAssets(short));
                Ok(ConfirmOutcome::Aborted(closure.reason))
            }
        }
    }

    /// Either side may cancel at any point before completion.
    pub fn cancel(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<TradeClosure, LootError> {
        let session = self.sessions.get(&trade_id).ok_or(LootError::UnknownTrade(trade_id))?;
        if !session.involves(participant) {
            return Err(LootError::NotTradeParticipant { trade: trade_id, participant: participant.clone() });
        }
        Ok(self.close(trade_id, TradeCancelReason::CancelledBy(participant.clone())))
    }

    /// Cancel requests that were never answered in time.
    pub fn sweep(&mut self, now: Tick) -> Vec<TradeClosure> {
        let mut closed = Vec::new();
        for id in self.request_expiries.pop_due(now) {
            let pending = self.sessions.get(&id).map(|s| s.state == TradeState::Pending);
            if pending == Some(true) {
                closed.push(self.close(id, TradeCancelReason::Expired));
            }
        }
        closed
    }

    pub fn session(&self, trade_id: TradeId) -> Option<&TradeSession> {
        self.sessions.get(&trade_id)
    }

    pub fn open_trade_of(&self, participant: &ParticipantId) -> Option<TradeId> {
        self.open_by_participant.get(participant).copied()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn pending_for_target(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<&mut TradeSession, LootError> {
        let session = self.sessions.get_mut(&trade_id).ok_or(LootError::UnknownTrade(trade_id))?;
        if &session.target != participant {
            return Err(LootError::NotTradeTarget { trade: trade_id, participant: participant.clone() });
        }
        if session.state != TradeState::Pending {
            return Err(LootError::TradeNotPending(trade_id));
        }
        Ok(session)
    }

    fn active_for(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<&mut TradeSession, LootError> {
        let session = self.sessions.get_mut(&trade_id).ok_or(LootError::UnknownTrade(trade_id))?;
        if !session.involves(participant) {
            return Err(LootError::NotTradeParticipant { trade: trade_id, participant: participant.clone() });
        }
        if session.state != TradeState::Active {
            return Err(LootError::TradeNotActive(trade_id));
        }
        Ok(session)
    }

    fn close(&mut self, trade_id: TradeId, reason: TradeCancelReason) -> TradeClosure {
        if let Some(session) = self.sessions.get_mut(&trade_id) {
            session.state = TradeState::Cancelled;
        }
        self.remove(trade_id);
        info!(trade = %trade_id, ?reason, "trade cancelled");
        TradeClosure { trade_id, reason }
    }

    fn remove(&mut self, trade_id: TradeId) {
        if let Some(session) = self.sessions.remove(&trade_id) {
            self.open_by_participant.remove(&session.initiator);
            self.open_by_participant.remove(&session.target);
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

enum Debit<'a> {
    Item(&'a ParticipantId, &'a ItemId, u32),
    Gold(&'a ParticipantId, u64),
}

/// Debit both offers in full, then credit the counterparties. If any debit
/// fails every earlier debit is reversed and the participant who came up
/// short is returned; no unit has moved in that case.
fn execute_exchange(session: &TradeSession, inventory: &mut impl Inventory) -> Result<(), ParticipantId> {
    let sides = [
        (&session.initiator, &session.initiator_offer),
        (&session.target, &session.target_offer),
    ];

    let mut applied: Vec<Debit<'_>> = Vec::new();
    for (owner, offer) in sides {
        for staged in &offer.items {
            if inventory.debit(owner, &staged.item, staged.amount) {
                applied.push(Debit::Item(owner, &staged.item, staged.amount));
            } else {
                refund(&applied, inventory);
                return Err(owner.clone());
            }
        }
        if offer.gold > 0 {
            if inventory.debit_gold(owner, offer.gold) {
                applied.push(Debit::Gold(owner, offer.gold));
            } else {
                refund(&applied, inventory);
                return Err(owner.clone());
            }
        }
    }

    for (owner, offer) in sides {
        let Some(receiver) = session.counterparty(owner) else { continue };
        for staged in &offer.items {
            inventory.credit(receiver, &staged.item, staged.amount);
        }
        if offer.gold > 0 {
            inventory.credit_gold(receiver, offer.gold);
        }
    }
    Ok(())
}

fn refund(applied: &[Debit<'_>], inventory: &mut impl Inventory) {
    for debit in applied.iter().rev() {
        match *debit {
            Debit::Item(owner, item, amount) => inventory.credit(owner, item, amount),
            Debit::Gold(owner, amount) => inventory.credit_gold(owner, amount),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

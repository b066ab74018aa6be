// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Session Coordinator

//! Explicitly constructed owner of all loot and trade state for one session.
//!
//! The process holding session authority builds one coordinator and feeds it
//! requests one at a time; participants never touch session state directly.
//! Each request reads the roster exactly once and works on that snapshot.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::{Host, RosterSnapshot};
use crate::config::SessionConfig;
use crate::dispatcher::{DispatchContext, Dispatcher, Distribution, LootPolicy, PolicyKind, RollSettlement};
use crate::error::LootError;
use crate::history::HistoryLedger;
use crate::roll::{ResolutionTrigger, RollOutcome, RollResolver, RollSession};
use crate::trade::{ConfirmOutcome, TradeClosure, TradeNegotiator, TradeSession};
use crate::types::{
    HistoryEntry, ItemId, LootDrop, LootEvent, ParticipantId, SessionId, Tick, TradeCancelReason, TradeId, Vote,
    VoteKind,
};

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub vote: Vote,
    /// Present when this vote completed the quorum.
    pub settlement: Option<RollSettlement>,
}

/// What happened during one tick of the sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    pub resolved_rolls: Vec<RollSettlement>,
    pub expired_trades: Vec<TradeId>,
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct SessionCoordinator<H: Host> {
    config: SessionConfig,
    host: H,
    rng: ChaCha8Rng,
    current_tick: Tick,
    dispatcher: Dispatcher,
    rolls: RollResolver,
    trades: TradeNegotiator,
    history: HistoryLedger,
}

impl<H: Host> SessionCoordinator<H> {
    pub fn new(config: SessionConfig, host: H) -> Self {
        let seed = config.seed.unwrap_or_else(clock_seed);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            current_tick: 0,
            dispatcher: Dispatcher::new(config.initial_policy),
            rolls: RollResolver::new(config.roll_timeout_ticks),
            trades: TradeNegotiator::new(config.trade_request_timeout_ticks),
            history: HistoryLedger::new(config.history_capacity),
            config,
            host,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn policy(&self) -> &LootPolicy {
        self.dispatcher.policy()
    }

    // ── Distribution ────────────────────────────────────────────────────────

    pub fn set_policy(&mut self, requester: &ParticipantId, kind: PolicyKind) -> Result<(), LootError> {
        let roster = RosterSnapshot::capture(&self.host);
        if self.dispatcher.set_policy(requester, kind, &roster)? {
            self.host.emit(LootEvent::PolicyChanged { policy: kind, by: requester.clone() });
        }
        Ok(())
    }

    pub fn distribute(&mut self, drop: LootDrop) -> Result<Distribution, LootError> {
        let roster = RosterSnapshot::capture(&self.host);
        let mut ctx = DispatchContext {
            host: &mut self.host,
            rolls: &mut self.rolls,
            ledger: &mut self.history,
            rng: &mut self.rng,
            now: self.current_tick,
            grant_lifetime: self.config.grant_lifetime_ticks,
        };
        self.dispatcher.distribute(drop, &roster, &mut ctx)
    }

    pub fn assign_master_loot(
        &mut self,
        requester: &ParticipantId,
        recipient: &ParticipantId,
        drop: LootDrop,
    ) -> Result<Distribution, LootError> {
        let roster = RosterSnapshot::capture(&self.host);
        let mut ctx = DispatchContext {
            host: &mut self.host,
            rolls: &mut self.rolls,
            ledger: &mut self.history,
            rng: &mut self.rng,
            now: self.current_tick,
            grant_lifetime: self.config.grant_lifetime_ticks,
        };
        self.dispatcher.assign_master_loot(requester, recipient, drop, &roster, &mut ctx)
    }

    // ── Rolls ───────────────────────────────────────────────────────────────

    pub fn submit_vote(
        &mut self,
        session_id: SessionId,
        participant: &ParticipantId,
        kind: VoteKind,
    ) -> Result<VoteResult, LootError> {
        let receipt = self
            .rolls
            .submit_vote(session_id, participant, kind, &mut self.rng, self.current_tick)?;
        self.host.emit(LootEvent::VoteCast {
            session_id,
            participant: participant.clone(),
            kind,
            roll: receipt.vote.roll,
        });
        let settlement = receipt.resolution.map(|outcome| self.settle(outcome));
        Ok(VoteResult { vote: receipt.vote, settlement })
    }

    /// Resolve a session now with whatever votes exist. Absent or already
    /// resolved ids return `None`.
    pub fn force_resolve(&mut self, session_id: SessionId) -> Option<RollSettlement> {
        let outcome = self.rolls.resolve(session_id, ResolutionTrigger::Forced, self.current_tick)?;
        Some(self.settle(outcome))
    }

    pub fn roll_session(&self, session_id: SessionId) -> Option<&RollSession> {
        self.rolls.session(session_id)
    }

    pub fn open_roll_sessions(&self) -> Vec<&RollSession> {
        self.rolls.open_sessions()
    }

    fn settle(&mut self, outcome: RollOutcome) -> RollSettlement {
        let mut ctx = DispatchContext {
            host: &mut self.host,
            rolls: &mut self.rolls,
            ledger: &mut self.history,
            rng: &mut self.rng,
            now: self.current_tick,
            grant_lifetime: self.config.grant_lifetime_ticks,
        };
        self.dispatcher.settle_roll(outcome, &mut ctx)
    }

    // ── Trades ──────────────────────────────────────────────────────────────

    pub fn initiate_trade(&mut self, initiator: &ParticipantId, target: &ParticipantId) -> Result<TradeId, LootError> {
        let trade_id = self.trades.initiate(initiator, target, self.current_tick)?;
        self.host.emit(LootEvent::TradeRequested {
            trade_id,
            initiator: initiator.clone(),
            target: target.clone(),
        });
        Ok(trade_id)
    }

    pub fn accept_trade(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<(), LootError> {
        self.trades.accept(trade_id, participant)?;
        self.host.emit(LootEvent::TradeAccepted { trade_id });
        Ok(())
    }

    pub fn decline_trade(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<(), LootError> {
        let closure = self.trades.decline(trade_id, participant)?;
        self.emit_closure(closure);
        Ok(())
    }

    pub fn stage_item(
        &mut self,
        trade_id: TradeId,
        participant: &ParticipantId,
        item: impl Into<ItemId>,
        amount: u32,
    ) -> Result<(), LootError> {
        self.trades.stage_item(trade_id, participant, item.into(), amount)?;
        self.host.emit(LootEvent::TradeOfferChanged { trade_id, by: participant.clone() });
        Ok(())
    }

    pub fn stage_gold(&mut self, trade_id: TradeId, participant: &ParticipantId, amount: u64) -> Result<(), LootError> {
        self.trades.stage_gold(trade_id, participant, amount)?;
        self.host.emit(LootEvent::TradeOfferChanged { trade_id, by: participant.clone() });
        Ok(())
    }

    pub fn confirm_trade(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<ConfirmOutcome, LootError> {
        let outcome = self.trades.confirm(trade_id, participant, &mut self.host)?;
        self.host.emit(LootEvent::TradeConfirmed { trade_id, by: participant.clone() });
        match &outcome {
            ConfirmOutcome::Waiting => {}
            ConfirmOutcome::Completed(_) => self.host.emit(LootEvent::TradeCompleted { trade_id }),
            ConfirmOutcome::Aborted(reason) => self.host.emit(LootEvent::TradeCancelled {
                trade_id,
                reason: reason.clone(),
            }),
        }
        Ok(outcome)
    }

    pub fn cancel_trade(&mut self, trade_id: TradeId, participant: &ParticipantId) -> Result<(), LootError> {
        let closure = self.trades.cancel(trade_id, participant)?;
        self.emit_closure(closure);
        Ok(())
    }

    pub fn trade(&self, trade_id: TradeId) -> Option<&TradeSession> {
        self.trades.session(trade_id)
    }

    pub fn open_trade_of(&self, participant: &ParticipantId) -> Option<TradeId> {
        self.trades.open_trade_of(participant)
    }

    fn emit_closure(&mut self, closure: TradeClosure) {
        self.host.emit(LootEvent::TradeCancelled {
            trade_id: closure.trade_id,
            reason: closure.reason,
        });
    }

    // ── History ─────────────────────────────────────────────────────────────

    pub fn recent_history(&self, count: usize) -> Vec<HistoryEntry> {
        self.history.recent_entries(count)
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    // ── Time ────────────────────────────────────────────────────────────────

    /// Advance one tick and sweep every deadline that has been reached.
    pub fn tick(&mut self) -> TickReport {
        self.current_tick += 1;
        let now = self.current_tick;

        let resolved_rolls: Vec<RollSettlement> = self
            .rolls
            .sweep(now)
            .into_iter()
            .map(|outcome| self.settle(outcome))
            .collect();

        let closures = self.trades.sweep(now);
        let expired_trades = closures.iter().map(|c| c.trade_id).collect();
        for closure in closures {
            debug_assert_eq!(closure.reason, TradeCancelReason::Expired);
            self.emit_closure(closure);
        }

        if !resolved_rolls.is_empty() {
            debug!(tick = now, resolved = resolved_rolls.len(), "expired roll sessions resolved");
        }
        TickReport { tick: now, resolved_rolls, expired_trades }
    }

    /// Run `ticks` ticks, discarding the reports.
    pub fn run_batch(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

// WASM callers always pass a seed; there is no clock to read here.
#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u64 {
    0
}

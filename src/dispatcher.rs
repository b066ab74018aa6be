// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Distribution Dispatcher
//
// Routes every generated (item, amount, position) through the session's
// active policy: straight to the world, to one owner, to several owners, or
// into a Need/Greed roll. Every assignment lands in the history ledger.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::{Host, RosterSnapshot};
use crate::error::LootError;
use crate::history::HistoryLedger;
use crate::roll::{RollOutcome, RollResolver};
use crate::types::{
    Grant, GrantId, GrantKind, HistoryEntry, LootDrop, LootEvent, ParticipantId, ResolutionMethod,
    SessionId, Tick, VoteKind,
};

// ─── Policies ────────────────────────────────────────────────────────────────

/// Policy tag, as chosen by the leader or named in config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PolicyKind {
    #[default]
    FreeForAll,
    RoundRobin,
    NeedGreed,
    PersonalLoot,
    MasterLoot,
}

impl PolicyKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "freeforall" | "ffa" => Some(Self::FreeForAll),
            "roundrobin" => Some(Self::RoundRobin),
            "needgreed" | "needbeforegreed" => Some(Self::NeedGreed),
            "personalloot" | "personal" => Some(Self::PersonalLoot),
            "masterloot" | "master" => Some(Self::MasterLoot),
            _ => None,
        }
    }
}

/// Active policy together with its own state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LootPolicy {
    FreeForAll,
    /// `cursor` is the roster index of the last recipient.
    RoundRobin { cursor: usize },
    NeedGreed,
    PersonalLoot,
    MasterLoot,
}

impl LootPolicy {
    pub fn from_kind(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::FreeForAll => Self::FreeForAll,
            PolicyKind::RoundRobin => Self::RoundRobin { cursor: 0 },
            PolicyKind::NeedGreed => Self::NeedGreed,
            PolicyKind::PersonalLoot => Self::PersonalLoot,
            PolicyKind::MasterLoot => Self::MasterLoot,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::FreeForAll => PolicyKind::FreeForAll,
            Self::RoundRobin { .. } => PolicyKind::RoundRobin,
            Self::NeedGreed => PolicyKind::NeedGreed,
            Self::PersonalLoot => PolicyKind::PersonalLoot,
            Self::MasterLoot => PolicyKind::MasterLoot,
        }
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Distribution {
    /// Placed in the world unowned.
    Dropped { grant_id: GrantId },
    /// Placed in the world locked to one owner.
    Assigned { grant_id: GrantId, recipient: ParticipantId, method: ResolutionMethod },
    /// Handed to a Need/Greed roll.
    Contested { session_id: SessionId, eligible: Vec<ParticipantId> },
    /// Zero or more independent personal grants.
    Personal { grants: Vec<(ParticipantId, GrantId)> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RollSettlement {
    Awarded { session_id: SessionId, recipient: ParticipantId, method: ResolutionMethod },
    /// Nobody claimed it; dropped FreeForAll.
    Dropped { session_id: SessionId, grant_id: GrantId },
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Borrowed view of everything a distribution may touch.
pub struct DispatchContext<'a, H: Host, R: Rng> {
    pub host: &'a mut H,
    pub rolls: &'a mut RollResolver,
    pub ledger: &'a mut HistoryLedger,
    pub rng: &'a mut R,
    pub now: Tick,
    pub grant_lifetime: Tick,
}

impl<H: Host, R: Rng> DispatchContext<'_, H, R> {
    fn new_grant(&self, drop: &LootDrop) -> Grant {
        Grant {
            item: drop.item.clone(),
            amount: drop.amount,
            position: drop.position,
            created_at: self.now,
            expires_at: self.now.saturating_add(self.grant_lifetime),
            owner: None,
            kind: GrantKind::Shared,
        }
    }

    fn spawn(&mut self, grant: Grant) -> GrantId {
        let grant_id = self.host.spawn_grant(&grant);
        debug!(grant = %grant_id, item = %grant.item, owner = ?grant.owner, "grant spawned");
        self.host.emit(LootEvent::GrantDropped { grant_id, grant });
        grant_id
    }

    fn drop_shared(&mut self, grant: Grant) -> GrantId {
        self.spawn(grant.reassigned(None, GrantKind::Shared))
    }

    fn record(&mut self, recipient: &ParticipantId, grant: &Grant, method: ResolutionMethod) {
        self.ledger.record(HistoryEntry {
            recipient: recipient.clone(),
            item: grant.item.clone(),
            amount: grant.amount,
            method,
            recorded_at: self.now,
        });
    }

    fn award_owned(&mut self, grant: Grant, recipient: &ParticipantId, kind: GrantKind, method: ResolutionMethod) -> GrantId {
        let owned = grant.reassigned(Some(recipient.clone()), kind);
        self.record(recipient, &owned, method);
        self.spawn(owned)
    }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatcher {
    policy: LootPolicy,
}

impl Dispatcher {
    pub fn new(kind: PolicyKind) -> Self {
        Self { policy: LootPolicy::from_kind(kind) }
    }

    pub fn policy(&self) -> &LootPolicy {
        &self.policy
    }

    /// Leader-only. Re-selecting the active policy keeps its state, so a
    /// RoundRobin cursor survives a redundant change.
    pub fn set_policy(
        &mut self,
        requester: &ParticipantId,
        kind: PolicyKind,
        roster: &RosterSnapshot,
    ) -> Result<bool, LootError> {
        if roster.resolved_leader() != Some(requester) {
            return Err(LootError::NotLeader(requester.clone()));
        }
        if self.policy.kind() == kind {
            return Ok(false);
        }
        info!(from = ?self.policy.kind(), to = ?kind, by = %requester, "loot policy changed");
        self.policy = LootPolicy::from_kind(kind);
        Ok(true)
    }

    pub fn distribute<H: Host, R: Rng>(
        &mut self,
        drop: LootDrop,
        roster: &RosterSnapshot,
        ctx: &mut DispatchContext<'_, H, R>,
    ) -> Result<Distribution, LootError> {
        if drop.amount == 0 {
            return Err(LootError::ZeroAmount);
        }
        let grant = ctx.new_grant(&drop);

        if roster.is_empty() {
            return Ok(match &drop.source_owner {
                Some(owner) => {
                    let grant_id = ctx.award_owned(grant, owner, GrantKind::Assigned, ResolutionMethod::Direct);
                    Distribution::Assigned { grant_id, recipient: owner.clone(), method: ResolutionMethod::Direct }
                }
                None => Distribution::Dropped { grant_id: ctx.drop_shared(grant) },
            });
        }

        let distribution = match &mut self.policy {
            LootPolicy::FreeForAll => Distribution::Dropped { grant_id: ctx.drop_shared(grant) },

            LootPolicy::RoundRobin { cursor } => {
                *cursor = (*cursor + 1) % roster.len();
                let recipient = roster.members[*cursor].clone();
                let method = ResolutionMethod::RoundRobin;
                let grant_id = ctx.award_owned(grant, &recipient, GrantKind::Assigned, method);
                Distribution::Assigned { grant_id, recipient, method }
            }

            LootPolicy::NeedGreed => {
                if roster.len() <= 1 {
                    Distribution::Dropped { grant_id: ctx.drop_shared(grant) }
                } else {
                    let eligible = roster.members.clone();
                    let contested = grant.reassigned(None, GrantKind::Rolled);
                    let session = ctx.rolls.open(contested, eligible.clone(), ctx.now);
                    let (session_id, expires_at) = (session.id, session.expires_at);
                    ctx.host.emit(LootEvent::RollSessionStarted {
                        session_id,
                        item: drop.item.clone(),
                        amount: drop.amount,
                        eligible: eligible.clone(),
                        expires_at,
                    });
                    Distribution::Contested { session_id, eligible }
                }
            }

            LootPolicy::PersonalLoot => {
                // Independent coin per member: zero, one or several grants.
                let chance = 1.0 / roster.len() as f64;
                let mut grants = Vec::new();
                for member in &roster.members {
                    if ctx.rng.gen_bool(chance) {
                        let grant_id = ctx.award_owned(grant.clone(), member, GrantKind::Personal, ResolutionMethod::Personal);
                        grants.push((member.clone(), grant_id));
                    }
                }
                Distribution::Personal { grants }
            }

            LootPolicy::MasterLoot => match roster.resolved_leader() {
                Some(leader) => {
                    let leader = leader.clone();
                    let method = ResolutionMethod::MasterLoot;
                    let grant_id = ctx.award_owned(grant, &leader, GrantKind::LeaderAssigned, method);
                    Distribution::Assigned { grant_id, recipient: leader, method }
                }
                None => Distribution::Dropped { grant_id: ctx.drop_shared(grant) },
            },
        };
        Ok(distribution)
    }

    /// Leader hands a drop to a chosen member under MasterLoot.
    pub fn assign_master_loot<H: Host, R: Rng>(
        &mut self,
        requester: &ParticipantId,
        recipient: &ParticipantId,
        drop: LootDrop,
        roster: &RosterSnapshot,
        ctx: &mut DispatchContext<'_, H, R>,
    ) -> Result<Distribution, LootError> {
        if self.policy.kind() != PolicyKind::MasterLoot {
            return Err(LootError::PolicyMismatch);
        }
        if roster.resolved_leader() != Some(requester) {
            return Err(LootError::NotLeader(requester.clone()));
        }
        if !roster.contains(recipient) {
            return Err(LootError::NotInRoster(recipient.clone()));
        }
        if drop.amount == 0 {
            return Err(LootError::ZeroAmount);
        }
        let grant = ctx.new_grant(&drop);
        let method = ResolutionMethod::MasterLoot;
        let grant_id = ctx.award_owned(grant, recipient, GrantKind::LeaderAssigned, method);
        info!(by = %requester, to = %recipient, grant = %grant_id, "master loot assigned");
        Ok(Distribution::Assigned { grant_id, recipient: recipient.clone(), method })
    }

    /// Hand a resolved roll to its winner's inventory, or drop it
    /// FreeForAll when nobody claimed it.
    pub fn settle_roll<H: Host, R: Rng>(
        &self,
        outcome: RollOutcome,
        ctx: &mut DispatchContext<'_, H, R>,
    ) -> RollSettlement {
        let session_id = outcome.session_id;
        let settlement = match &outcome.winner {
            Some(vote) => {
                let method = match vote.kind {
                    VoteKind::Need => ResolutionMethod::Need { roll: vote.roll },
                    _ => ResolutionMethod::Greed { roll: vote.roll },
                };
                ctx.host.credit(&vote.participant, &outcome.grant.item, outcome.grant.amount);
                ctx.record(&vote.participant, &outcome.grant, method);
                RollSettlement::Awarded { session_id, recipient: vote.participant.clone(), method }
            }
            None => {
                let grant_id = ctx.drop_shared(outcome.grant.clone());
                RollSettlement::Dropped { session_id, grant_id }
            }
        };
        ctx.host.emit(LootEvent::RollSessionResolved {
            session_id,
            winner: outcome.winner.map(|v| v.participant),
        });
        settlement
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

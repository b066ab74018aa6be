// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Roll Resolver
//
// One timed Need/Greed/Pass vote per contested grant. A session is open
// until every eligible participant has voted or its expiry tick is reached,
// whichever comes first, and is resolved exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::LootError;
use crate::schedule::ExpiryQueue;
use crate::types::{Grant, ParticipantId, SessionId, Tick, Vote, VoteKind};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollSession {
    pub id: SessionId,
    pub grant: Grant,
    /// Roster snapshot taken when the session opened.
    pub eligible: Vec<ParticipantId>,
    /// Votes in submission order.
    pub votes: Vec<Vote>,
    pub started_at: Tick,
    pub expires_at: Tick,
}

impl RollSession {
    pub fn is_eligible(&self, participant: &ParticipantId) -> bool {
        self.eligible.contains(participant)
    }

    pub fn has_voted(&self, participant: &ParticipantId) -> bool {
        self.votes.iter().any(|v| &v.participant == participant)
    }

    pub fn quorum_reached(&self) -> bool {
        self.eligible.iter().all(|p| self.has_voted(p))
    }

    /// Eligible participants who have not voted yet.
    pub fn pending(&self) -> Vec<ParticipantId> {
        self.eligible.iter().filter(|p| !self.has_voted(p)).cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResolutionTrigger {
    Quorum,
    Expired,
    Forced,
}

/// Result of resolving one session. `winner == None` means the grant falls
/// back to FreeForAll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollOutcome {
    pub session_id: SessionId,
    pub grant: Grant,
    pub winner: Option<Vote>,
    pub votes: Vec<Vote>,
    pub trigger: ResolutionTrigger,
    pub resolved_at: Tick,
}

/// A cast vote plus, when it completed the quorum, the resolution it caused.
#[derive(Debug, Clone)]
pub struct VoteReceipt {
    pub vote: Vote,
    pub resolution: Option<RollOutcome>,
}

// ---------------------------------------------------------------------------
// Winner selection
// ---------------------------------------------------------------------------

/// Need beats Greed beats Pass. Within a kind the highest roll wins and an
/// equal roll goes to whoever submitted first. All-Pass or no votes: `None`.
pub fn select_winner(votes: &[Vote]) -> Option<&Vote> {
    best_of(votes, VoteKind::Need).or_else(|| best_of(votes, VoteKind::Greed))
}

fn best_of(votes: &[Vote], kind: VoteKind) -> Option<&Vote> {
    votes
        .iter()
        .filter(|v| v.kind == kind)
        .fold(None, |best: Option<&Vote>, v| match best {
            Some(b) if rank(b) >= rank(v) => Some(b),
            _ => Some(v),
        })
}

fn rank(vote: &Vote) -> (u8, Reverse<u64>) {
    (vote.roll, Reverse(vote.sequence))
}

/// Need/Greed roll in 1..=100; Pass is always 0.
pub fn draw_roll<R: Rng>(kind: VoteKind, rng: &mut R) -> u8 {
    match kind {
        VoteKind::Pass => 0,
        VoteKind::Need | VoteKind::Greed => rng.gen_range(1..=100),
    }
}

// ---------------------------------------------------------------------------
// Resolver (session registry)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RollResolver {
    sessions: HashMap<SessionId, RollSession>,
    expiries: ExpiryQueue<SessionId>,
    timeout_ticks: Tick,
    next_session_id: u64,
    next_sequence: u64,
}

impl RollResolver {
    pub fn new(timeout_ticks: Tick) -> Self {
        Self {
            sessions: HashMap::new(),
            expiries: ExpiryQueue::new(),
            timeout_ticks: timeout_ticks.max(1),
            next_session_id: 0,
            next_sequence: 0,
        }
    }

    /// Open a session over a fixed eligible set.
    pub fn open(&mut self, grant: Grant, eligible: Vec<ParticipantId>, now: Tick) -> &RollSession {
        self.next_session_id += 1;
        let id = SessionId(self.next_session_id);
        let expires_at = now.saturating_add(self.timeout_ticks);
        self.expiries.schedule(expires_at, id);
        info!(session = %id, item = %grant.item, eligible = eligible.len(), expires_at, "roll session opened");
        self.sessions.entry(id).or_insert(RollSession {
            id,
            grant,
            eligible,
            votes: Vec::new(),
            started_at: now,
            expires_at,
        })
    }

    /// Record a vote with a freshly drawn roll. Completing the quorum
    /// resolves the session immediately.
    pub fn submit_vote<R: Rng>(
        &mut self,
        session_id: SessionId,
        participant: &ParticipantId,
        kind: VoteKind,
        rng: &mut R,
        now: Tick,
    ) -> Result<VoteReceipt, LootError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(LootError::UnknownRollSession(session_id))?;
        if now >= session.expires_at {
            return Err(LootError::RollExpired(session_id));
        }
        if !session.is_eligible(participant) {
            return Err(LootError::NotEligible { session: session_id, participant: participant.clone() });
        }
        if session.has_voted(participant) {
            return Err(LootError::AlreadyVoted { session: session_id, participant: participant.clone() });
        }

        self.next_sequence += 1;
        let vote = Vote {
            participant: participant.clone(),
            kind,
            roll: draw_roll(kind, rng),
            sequence: self.next_sequence,
            cast_at: now,
        };
        debug!(session = %session_id, participant = %participant, ?kind, roll = vote.roll, "vote cast");
        session.votes.push(vote.clone());

        let resolution = if session.quorum_reached() {
            self.resolve(session_id, ResolutionTrigger::Quorum, now)
        } else {
            None
        };
        Ok(VoteReceipt { vote, resolution })
    }

    /// Resolve and remove a session. Absent ids are a no-op.
    pub fn resolve(&mut self, session_id: SessionId, trigger: ResolutionTrigger, now: Tick) -> Option<RollOutcome> {
        let session = self.sessions.remove(&session_id)?;
        let winner = select_winner(&session.votes).cloned();
        info!(
            session = %session_id,
            ?trigger,
            winner = winner.as_ref().map(|v| v.participant.0.as_str()).unwrap_or("none"),
            votes = session.votes.len(),
            "roll session resolved"
        );
        Some(RollOutcome {
            session_id,
            grant: session.grant,
            winner,
            votes: session.votes,
            trigger,
            resolved_at: now,
        })
    }

    /// Force-resolve every session whose expiry tick has been reached.
    pub fn sweep(&mut self, now: Tick) -> Vec<RollOutcome> {
        self.expiries
            .pop_due(now)
            .into_iter()
            .filter_map(|id| self.resolve(id, ResolutionTrigger::Expired, now))
            .collect()
    }

    pub fn session(&self, session_id: SessionId) -> Option<&RollSession> {
        self.sessions.get(&session_id)
    }

    pub fn open_sessions(&self) -> Vec<&RollSession> {
        let mut open: Vec<&RollSession> = self.sessions.values().collect();
        open.sort_by_key(|s| s.id);
        open
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

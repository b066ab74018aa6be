// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Rejection Taxonomy

//! Every rejection is local and non-fatal: the request is refused, no state
//! changes, and the caller gets a typed reason it can show to a player.

use serde::{Deserialize, Serialize};

use crate::types::{ParticipantId, SessionId, TradeId};

/// Coarse category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or ineligible request.
    Validation,
    /// Leader-only action attempted by someone else.
    Authorization,
    /// Duplicate request, or action on a finished/absent session.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LootError {
    // ── Validation ──
    #[error("{participant} is not eligible to vote in {session}")]
    NotEligible { session: SessionId, participant: ParticipantId },

    #[error("{0} cannot open a trade with themselves")]
    SelfTrade(ParticipantId),

    #[error("{0} is not active")]
    TradeNotActive(TradeId),

    #[error("{participant} is not a party to {trade}")]
    NotTradeParticipant { trade: TradeId, participant: ParticipantId },

    #[error("only the target of {trade} may respond to it, not {participant}")]
    NotTradeTarget { trade: TradeId, participant: ParticipantId },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("staged total would exceed the largest representable amount")]
    AmountOverflow,

    #[error("{0} is not in the party roster")]
    NotInRoster(ParticipantId),

    #[error("leader assignment requires the MasterLoot policy")]
    PolicyMismatch,

    // ── Authorization ──
    #[error("{0} is not the party leader")]
    NotLeader(ParticipantId),

    // ── Conflict ──
    #[error("{participant} already voted in {session}")]
    AlreadyVoted { session: SessionId, participant: ParticipantId },

    #[error("{0} is not open")]
    UnknownRollSession(SessionId),

    #[error("{0} has expired and is awaiting resolution")]
    RollExpired(SessionId),

    #[error("{0} already has an open trade")]
    TradeAlreadyOpen(ParticipantId),

    #[error("{0} is busy in another trade")]
    TargetBusy(ParticipantId),

    #[error("{0} is not open")]
    UnknownTrade(TradeId),

    #[error("{0} is not awaiting a response")]
    TradeNotPending(TradeId),

    #[error("nothing has been staged in {0}")]
    NothingStaged(TradeId),

    #[error("{participant} already confirmed {trade}")]
    AlreadyConfirmed { trade: TradeId, participant: ParticipantId },
}

impl LootError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEligible { .. }
            | Self::SelfTrade(_)
            | Self::TradeNotActive(_)
            | Self::NotTradeParticipant { .. }
            | Self::NotTradeTarget { .. }
            | Self::ZeroAmount
            | Self::AmountOverflow
            | Self::NotInRoster(_)
            | Self::PolicyMismatch => ErrorKind::Validation,
            Self::NotLeader(_) => ErrorKind::Authorization,
            Self::AlreadyVoted { .. }
            | Self::UnknownRollSession(_)
            | Self::RollExpired(_)
            | Self::TradeAlreadyOpen(_)
            | Self::TargetBusy(_)
            | Self::UnknownTrade(_)
            | Self::TradeNotPending(_)
            | Self::NothingStaged(_)
            | Self::AlreadyConfirmed { .. } => ErrorKind::Conflict,
        }
    }
}

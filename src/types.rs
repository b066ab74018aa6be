// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical session time. One tick per processing step of the authority.
pub type Tick = u64;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Participant identity as resolved by the (external) authentication layer.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self { ParticipantId(s) }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self { ParticipantId(s.to_string()) }
}

/// Item reference as understood by the loot table and inventory collaborators.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self { ItemId(s) }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self { ItemId(s.to_string()) }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Roll session identifier, unique within one coordinator.
    SessionId, "roll"
);
numeric_id!(
    /// Trade session identifier, unique within one coordinator.
    TradeId, "trade"
);
numeric_id!(
    /// Identifier handed back by the world collaborator for a spawned grant.
    GrantId, "grant"
);

// ─── Grant ───────────────────────────────────────────────────────────────────

/// World position of a drop. Never interpreted here, only passed through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GrantKind {
    /// Unowned, first interaction claims it.
    Shared,
    /// Owner-locked by RoundRobin or a solo drop.
    Assigned,
    /// One of the independent PersonalLoot grants.
    Personal,
    /// Owner picked by the party leader (MasterLoot).
    LeaderAssigned,
    /// Awarded by a Need/Greed roll.
    Rolled,
}

/// A single awarded or droppable unit of loot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub item: ItemId,
    pub amount: u32,
    pub position: Position,
    pub created_at: Tick,
    pub expires_at: Tick,
    pub owner: Option<ParticipantId>,
    pub kind: GrantKind,
}

impl Grant {
    pub fn is_personal(&self) -> bool {
        self.kind == GrantKind::Personal
    }

    pub fn is_leader_assigned(&self) -> bool {
        self.kind == GrantKind::LeaderAssigned
    }

    /// Same item, amount and position with a new owner and kind.
    pub fn reassigned(&self, owner: Option<ParticipantId>, kind: GrantKind) -> Self {
        Self { owner, kind, ..self.clone() }
    }
}

/// Raw `(item, amount, position)` candidate produced by the loot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootDrop {
    pub item: ItemId,
    pub amount: u32,
    pub position: Position,
    #[serde(default)]
    pub source_owner: Option<ParticipantId>,
}

impl LootDrop {
    pub fn new(item: impl Into<ItemId>, amount: u32, position: Position) -> Self {
        Self { item: item.into(), amount, position, source_owner: None }
    }

    pub fn with_source_owner(mut self, owner: impl Into<ParticipantId>) -> Self {
        self.source_owner = Some(owner.into());
        self
    }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Need,
    Greed,
    Pass,
}

impl VoteKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "need" => Some(Self::Need),
            "greed" => Some(Self::Greed),
            "pass" => Some(Self::Pass),
            _ => None,
        }
    }
}

/// A cast vote. `roll` is drawn by the resolver, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub participant: ParticipantId,
    pub kind: VoteKind,
    /// 1..=100 for Need/Greed, 0 for Pass.
    pub roll: u8,
    /// Global submission order, used for tie-breaks.
    pub sequence: u64,
    pub cast_at: Tick,
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResolutionMethod {
    RoundRobin,
    Need { roll: u8 },
    Greed { roll: u8 },
    Personal,
    MasterLoot,
    /// Solo drop straight to the source owner.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recipient: ParticipantId,
    pub item: ItemId,
    pub amount: u32,
    pub method: ResolutionMethod,
    pub recorded_at: Tick,
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeCancelReason {
    Declined,
    CancelledBy(ParticipantId),
    Expired,
    InsufficientAssets(ParticipantId),
}

/// Outbound notifications for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LootEvent {
    GrantDropped { grant_id: GrantId, grant: Grant },
    PolicyChanged { policy: crate::dispatcher::PolicyKind, by: ParticipantId },
    RollSessionStarted {
        session_id: SessionId,
        item: ItemId,
        amount: u32,
        eligible: Vec<ParticipantId>,
        expires_at: Tick,
    },
    VoteCast { session_id: SessionId, participant: ParticipantId, kind: VoteKind, roll: u8 },
    RollSessionResolved { session_id: SessionId, winner: Option<ParticipantId> },
    TradeRequested { trade_id: TradeId, initiator: ParticipantId, target: ParticipantId },
    TradeAccepted { trade_id: TradeId },
    TradeOfferChanged { trade_id: TradeId, by: ParticipantId },
    TradeConfirmed { trade_id: TradeId, by: ParticipantId },
    TradeCompleted { trade_id: TradeId },
    TradeCancelled { trade_id: TradeId, reason: TradeCancelReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_kind_parse_is_case_insensitive() {
        assert_eq!(VoteKind::parse("NEED"), Some(VoteKind::Need));
        assert_eq!(VoteKind::parse("greed"), Some(VoteKind::Greed));
        assert_eq!(VoteKind::parse("Pass"), Some(VoteKind::Pass));
        assert_eq!(VoteKind::parse("maybe"), None);
    }

    #[test]
    fn numeric_ids_display_with_prefix() {
        assert_eq!(SessionId(7).to_string(), "roll-7");
        assert_eq!(TradeId(3).to_string(), "trade-3");
        assert_eq!(GrantId(12).to_string(), "grant-12");
    }

    #[test]
    fn reassigned_keeps_payload() {
        let grant = Grant {
            item: ItemId::from("sword"),
            amount: 1,
            position: Position::new(1.0, 2.0, 3.0),
            created_at: 5,
            expires_at: 10,
            owner: None,
            kind: GrantKind::Shared,
        };
        let owned = grant.reassigned(Some(ParticipantId::from("a")), GrantKind::Personal);
        assert!(owned.is_personal());
        assert_eq!(owned.item, grant.item);
        assert_eq!(owned.position, grant.position);
        assert_eq!(owned.expires_at, 10);
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine

pub mod types;
pub mod error;
pub mod config;
pub mod schedule;
pub mod history;
pub mod collaborators;
pub mod memory;
pub mod roll;
pub mod trade;
pub mod dispatcher;
pub mod coordinator;
pub mod arena;

pub use types::*;
pub use error::{ErrorKind, LootError};
pub use config::{ConfigError, SessionConfig};
pub use collaborators::{EventSink, Host, Inventory, RosterProvider, RosterSnapshot, WorldSpawner};
pub use memory::{MemoryHost, Wallet};
pub use dispatcher::{Distribution, LootPolicy, PolicyKind, RollSettlement};
pub use coordinator::{SessionCoordinator, TickReport, VoteResult};
pub use trade::{ConfirmOutcome, TradeOffer, TradeSession, TradeState};
pub use arena::LootArena;

use arena::{participant, reject};
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl LootArena {
    /// `members` is a JS array of participant names; the first one leads.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, members: JsValue) -> Result<LootArena, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let members: Vec<String> = serde_wasm_bindgen::from_value(members)?;
        Ok(LootArena::with_members(seed, members))
    }

    // --- Roster ---

    pub fn join(&mut self, name: &str) {
        self.coordinator.host_mut().join(name);
    }

    pub fn leave(&mut self, name: &str) {
        self.coordinator.host_mut().leave(&participant(name));
    }

    pub fn set_leader(&mut self, name: Option<String>) {
        self.coordinator.host_mut().set_leader(name.map(ParticipantId::from));
    }

    // --- Distribution ---

    pub fn set_policy(&mut self, requester: &str, policy: &str) -> Result<(), JsValue> {
        let kind = PolicyKind::parse(policy).ok_or_else(|| JsValue::from_str(&format!("unknown policy {policy}")))?;
        self.coordinator.set_policy(&participant(requester), kind).map_err(reject)
    }

    pub fn get_policy(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.coordinator.policy()).unwrap_or(JsValue::NULL)
    }

    pub fn distribute(
        &mut self,
        item: &str,
        amount: u32,
        x: f64,
        y: f64,
        z: f64,
        source_owner: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let mut drop = LootDrop::new(item, amount, Position::new(x, y, z));
        if let Some(owner) = source_owner {
            drop = drop.with_source_owner(owner);
        }
        let result = self.coordinator.distribute(drop).map_err(reject)?;
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    pub fn assign_master_loot(
        &mut self,
        requester: &str,
        recipient: &str,
        item: &str,
        amount: u32,
    ) -> Result<JsValue, JsValue> {
        let drop = LootDrop::new(item, amount, Position::default());
        let result = self
            .coordinator
            .assign_master_loot(&participant(requester), &participant(recipient), drop)
            .map_err(reject)?;
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    // --- Rolls ---

    pub fn submit_vote(&mut self, session_id: u64, voter: &str, kind: &str) -> Result<JsValue, JsValue> {
        let kind = VoteKind::parse(kind).ok_or_else(|| JsValue::from_str(&format!("unknown vote {kind}")))?;
        let result = self
            .coordinator
            .submit_vote(SessionId(session_id), &participant(voter), kind)
            .map_err(reject)?;
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    pub fn force_resolve(&mut self, session_id: u64) -> JsValue {
        match self.coordinator.force_resolve(SessionId(session_id)) {
            Some(settlement) => serde_wasm_bindgen::to_value(&settlement).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    pub fn get_roll_sessions(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.coordinator.open_roll_sessions()).unwrap_or(JsValue::NULL)
    }

    // --- Trades ---

    pub fn initiate_trade(&mut self, initiator: &str, target: &str) -> Result<u64, JsValue> {
        self.coordinator
            .initiate_trade(&participant(initiator), &participant(target))
            .map(|id| id.0)
            .map_err(reject)
    }

    pub fn accept_trade(&mut self, trade_id: u64, who: &str) -> Result<(), JsValue> {
        self.coordinator.accept_trade(TradeId(trade_id), &participant(who)).map_err(reject)
    }

    pub fn decline_trade(&mut self, trade_id: u64, who: &str) -> Result<(), JsValue> {
        self.coordinator.decline_trade(TradeId(trade_id), &participant(who)).map_err(reject)
    }

    pub fn stage_item(&mut self, trade_id: u64, who: &str, item: &str, amount: u32) -> Result<(), JsValue> {
        self.coordinator
            .stage_item(TradeId(trade_id), &participant(who), item, amount)
            .map_err(reject)
    }

    pub fn stage_gold(&mut self, trade_id: u64, who: &str, amount: u64) -> Result<(), JsValue> {
        self.coordinator.stage_gold(TradeId(trade_id), &participant(who), amount).map_err(reject)
    }

    pub fn confirm_trade(&mut self, trade_id: u64, who: &str) -> Result<JsValue, JsValue> {
        let outcome = self.coordinator.confirm_trade(TradeId(trade_id), &participant(who)).map_err(reject)?;
        Ok(serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL))
    }

    pub fn cancel_trade(&mut self, trade_id: u64, who: &str) -> Result<(), JsValue> {
        self.coordinator.cancel_trade(TradeId(trade_id), &participant(who)).map_err(reject)
    }

    pub fn get_trade(&self, trade_id: u64) -> JsValue {
        match self.coordinator.trade(TradeId(trade_id)) {
            Some(session) => serde_wasm_bindgen::to_value(session).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    // --- Inventory ---

    pub fn give_item(&mut self, who: &str, item: &str, amount: u32) {
        self.coordinator.host_mut().credit(&participant(who), &ItemId::from(item), amount);
    }

    pub fn give_gold(&mut self, who: &str, amount: u64) {
        self.coordinator.host_mut().credit_gold(&participant(who), amount);
    }

    pub fn get_wallet(&self, who: &str) -> JsValue {
        serde_wasm_bindgen::to_value(&self.coordinator.host().wallet(&participant(who))).unwrap_or(JsValue::NULL)
    }

    // --- Time, events, history ---

    pub fn tick(&mut self) -> JsValue {
        let report = self.coordinator.tick();
        serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL)
    }

    pub fn run_batch(&mut self, ticks: u32) {
        self.coordinator.run_batch(ticks);
    }

    pub fn current_tick(&self) -> u64 {
        self.coordinator.current_tick()
    }

    pub fn drain_events(&mut self) -> JsValue {
        let events = self.coordinator.host_mut().drain_events();
        serde_wasm_bindgen::to_value(&events).unwrap_or(JsValue::NULL)
    }

    pub fn recent_history(&self, count: usize) -> JsValue {
        serde_wasm_bindgen::to_value(&self.coordinator.recent_history(count)).unwrap_or(JsValue::NULL)
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Browser Arena

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::SessionConfig;
use crate::coordinator::SessionCoordinator;
use crate::error::{ErrorKind, LootError};
use crate::memory::MemoryHost;
use crate::types::ParticipantId;

/// A seeded session over an in-memory party, driven from JavaScript.
/// The exported methods live in `lib.rs`.
#[wasm_bindgen]
pub struct LootArena {
    pub(crate) coordinator: SessionCoordinator<MemoryHost>,
}

impl LootArena {
    pub fn with_members(seed: u64, members: Vec<String>) -> Self {
        Self::with_config(SessionConfig::default().with_seed(seed), members)
    }

    pub fn with_config(config: SessionConfig, members: Vec<String>) -> Self {
        Self {
            coordinator: SessionCoordinator::new(config, MemoryHost::with_party(members)),
        }
    }

    pub fn coordinator(&self) -> &SessionCoordinator<MemoryHost> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut SessionCoordinator<MemoryHost> {
        &mut self.coordinator
    }
}

/// Shape of every rejected call as seen from JavaScript.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&LootError> for Rejection {
    fn from(err: &LootError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

pub(crate) fn reject(err: LootError) -> JsValue {
    let rejection = Rejection::from(&err);
    serde_wasm_bindgen::to_value(&rejection).unwrap_or_else(|_| JsValue::from_str(&rejection.message))
}

pub(crate) fn participant(name: &str) -> ParticipantId {
    ParticipantId::from(name)
}

//! Simulation test fixtures: a minimal deterministic counter game.
#![allow(dead_code)]

use lockmesh_engine::{Engine, Rule, RuleViolation};
use lockmesh_journal::MemoryJournal;
use lockmesh_node::NodeStateMachine;
use lockmesh_types::{ActionMeta, PeerId, RoomConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub scores: BTreeMap<String, i64>,
    /// Applied actions in order: (tick, author, amount). Any divergence in
    /// cross-peer ordering shows up here byte-for-byte.
    pub log: Vec<(i64, String, i64)>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            scores: BTreeMap::new(),
            log: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameMove {
    Add { amount: i64 },
}

pub struct GameRules;

impl Rule<GameState, GameMove> for GameRules {
    fn is_legal(
        &self,
        _state: &GameState,
        action: &GameMove,
        _meta: &ActionMeta,
    ) -> Result<(), RuleViolation> {
        let GameMove::Add { amount } = action;
        if *amount < 0 {
            return Err(RuleViolation::new("amount must be non-negative"));
        }
        Ok(())
    }

    fn apply(&self, state: &GameState, action: &GameMove, meta: &ActionMeta) -> GameState {
        let GameMove::Add { amount } = action;
        let mut next = state.clone();
        *next.scores.entry(meta.from.to_string()).or_insert(0) += amount;
        next.log.push((meta.tick.0, meta.from.to_string(), *amount));
        next
    }
}

pub fn game_engine() -> Engine<GameState, GameMove> {
    Engine::builder(GameState::new(), GameRules).build()
}

pub fn game_node(
    local: &str,
    room: RoomConfig,
) -> NodeStateMachine<GameState, GameMove, MemoryJournal> {
    NodeStateMachine::new(
        PeerId::from(local),
        room,
        game_engine(),
        MemoryJournal::new(),
    )
    .expect("empty journal recovery cannot fail")
}

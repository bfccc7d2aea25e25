//! Shared test fixtures: a minimal deterministic counter game.
#![allow(dead_code)]

use lockmesh_engine::{Engine, Rule, RuleViolation, Schedule, Scheduler, System};
use lockmesh_journal::MemoryJournal;
use lockmesh_node::NodeStateMachine;
use lockmesh_types::{ActionMeta, PeerId, RoomConfig, TickMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Game state: per-peer scores plus bookkeeping that exposes ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub scores: BTreeMap<String, i64>,
    /// Every applied action in order: (tick, author, amount). Makes any
    /// cross-peer ordering difference visible in the state itself.
    pub log: Vec<(i64, String, i64)>,
    pub passes: u64,
    pub decay_ticks: Vec<i64>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            scores: BTreeMap::new(),
            log: vec![],
            passes: 0,
            decay_ticks: vec![],
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

pub struct CountPasses;

impl System<GameState> for CountPasses {
    fn update(&self, state: &GameState, _meta: &ActionMeta) -> GameState {
        let mut next = state.clone();
        next.passes += 1;
        next
    }
}

pub struct DecayEveryFour;

impl Scheduler<GameState> for DecayEveryFour {
    fn id(&self) -> &str {
        "decay"
    }

    fn schedule(&self) -> Schedule {
        Schedule::every(4)
    }

    fn apply(&self, state: &GameState, meta: &TickMeta) -> GameState {
        let mut next = state.clone();
        next.decay_ticks.push(meta.tick.0);
        next
    }
}

pub fn game_engine() -> Engine<GameState, GameMove> {
    Engine::builder(GameState::new(), GameRules)
        .system(CountPasses)
        .scheduler(DecayEveryFour)
        .build()
}

pub fn game_room() -> RoomConfig {
    RoomConfig::new("arena", 0).with_tick_ms(100)
}

pub fn game_node(local: &str) -> NodeStateMachine<GameState, GameMove, MemoryJournal> {
    NodeStateMachine::new(
        PeerId::from(local),
        game_room(),
        game_engine(),
        MemoryJournal::new(),
    )
    .expect("empty journal recovery cannot fail")
}

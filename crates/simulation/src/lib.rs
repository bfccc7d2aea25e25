//! Deterministic multi-node simulation.
//!
//! Runs any number of [`NodeStateMachine`]s on a single thread with a
//! virtual clock and a seeded network, producing bit-reproducible runs: the
//! same configuration and script always yields byte-identical commit
//! streams. This is the harness the protocol's correctness tests run on —
//! wall-clock flakiness cannot exist here because there is no wall clock.
//!
//! # Goals
//!
//! 1. **Determinism**: a fixed seed fixes every latency sample and the
//!    complete event order
//! 2. **Time travel**: `run_until` advances virtual time as fast as the
//!    event queue drains
//! 3. **Real plumbing**: the machines under test are the production node
//!    machines, commit pipeline included
//!
//! # Non-Goals
//!
//! - **Parallelism**: nodes run sequentially on one thread
//! - **Packet loss**: the protocol assumes a reliable ordered-per-sender
//!   transport, so the network model reorders across senders but never
//!   drops
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     SimulationRunner                      │
//! │                                                           │
//! │   BinaryHeap of (due_ms, priority, seq) → Event           │
//! │        │ pop in deterministic order                       │
//! │        ▼                                                  │
//! │   ┌─────────┐   ┌─────────┐   ┌─────────┐                 │
//! │   │ Node A  │   │ Node B  │   │ Node C  │  …              │
//! │   │ machine │   │ machine │   │ machine │                 │
//! │   └────┬────┘   └────┬────┘   └────┬────┘                 │
//! │        │ actions     │             │                      │
//! │        ▼             ▼             ▼                      │
//! │   SimulatedNetwork: seeded latency, per-link order floor  │
//! │        │ schedules MessageReceived at delivery time       │
//! │        └───────────────► back into the heap               │
//! └───────────────────────────────────────────────────────────┘
//! ```

mod config;
mod network;
mod runner;

pub use config::{NetworkConfig, SimulationConfig};
pub use network::SimulatedNetwork;
pub use runner::SimulationRunner;

//! Lockstep ordering state machine.
//!
//! This crate implements the tick-barrier protocol that turns a mesh of
//! peers into a single deterministic, gap-free sequence of action commits —
//! without a host. Every peer running the same protocol with the same
//! configuration and membership view produces bit-identical commits.
//!
//! # Protocol Overview
//!
//! 1. **Propose**: a locally submitted action targets
//!    `tick_at(now) + input_delay_ticks` and is broadcast immediately; the
//!    delay gives it time to reach every peer before the target seals.
//!
//! 2. **Seal**: entering tick `t` closes tick `t − 1 + input_delay_ticks`
//!    for the local author — a broadcast declaration of the highest seq it
//!    contributed (or −1 for none).
//!
//! 3. **Barrier**: a tick is committable once every eligible peer's seal
//!    for it has been recorded. A missing seal stalls the tick for
//!    everyone; a disconnect removes the blocker's eligibility and may
//!    unblock.
//!
//! 4. **Commit**: ticks commit strictly in order (head-of-line). The
//!    commit's action list is the deterministic flattening — eligible peers
//!    in lexicographic order, each peer's proposals ascending by seq.
//!
//! # Architecture
//!
//! ```text
//! TickElapsed ──► advance ticks ──► seal horizons ──┐
//! LocalAction ──► buffer + ACTION_PROPOSE           │
//! ACTION_SEAL ──► record seal ──────────────────────┤
//! peer events ──► eligibility updates ──────────────┤
//! SYNC_CLOCK ───► monotone forward warp ────────────┤
//!                                                   ▼
//!                                     advance committed ticks
//!                                     (barrier + head-of-line)
//!                                                   │
//!                                                   ▼
//!                                  CommitReady + ACTION_COMMIT gossip
//! ```
//!
//! All I/O is handled by the runner; the machine only returns actions.

mod config;
mod state;

pub use config::OrderingConfig;
pub use state::LockstepOrdering;

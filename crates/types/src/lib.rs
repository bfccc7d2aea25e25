//! Core types for the lockmesh lockstep ordering protocol.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - [`PeerId`], [`Tick`], [`Height`]: protocol identifiers
//! - [`RoomConfig`]: immutable per-session configuration
//! - [`TickClock`]: wall-time ↔ logical-tick arithmetic
//! - [`SignedAction`], [`Commit`]: the units of the ordered action stream
//! - [`ActionMeta`], [`TickMeta`]: reducer metadata
//! - [`PeerInfo`], [`PeerEvent`]: membership vocabulary
//!
//! Everything here is plain data: no I/O, no clocks, no randomness. The
//! protocol's determinism rests on these types having a single canonical
//! ordering ([`PeerId`] sorts by lexicographic byte order, seqs sort
//! numerically), so the comparison impls are part of the contract.

mod action;
mod clock;
mod config;
mod ids;
mod peer;

pub use action::{ActionMeta, Commit, SignedAction, TickMeta};
pub use clock::TickClock;
pub use config::RoomConfig;
pub use ids::{Height, PeerId, Tick};
pub use peer::{PeerEvent, PeerInfo, PeerRole};

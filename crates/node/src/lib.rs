//! Node runtime: ordering → engine → journal, optimistic state, and the
//! tokio driver.
//!
//! Two layers with a sharp boundary:
//!
//! - [`NodeStateMachine`] is synchronous and deterministic. It composes the
//!   lockstep ordering machine, the application engine, the commit journal,
//!   and the optimistic pending queue. Commits flow through its pipeline
//!   inline, so every runner — the deterministic simulator and the tokio
//!   runtime alike — drives the identical logic.
//! - [`NodeRuntime`] is the tokio driver: one task owning the machine, a
//!   ticker, the transport event stream, a command channel, and the timer
//!   wheel. Being a single task is the serialization the commit pipeline
//!   requires; each commit completes before the next event is processed.
//!
//! The transport itself is an external collaborator consumed through the
//! [`Transport`] contract. [`MemoryTransport`] is the in-process reference
//! implementation used by tests and local meshes.

mod error;
mod membership;
mod memory_transport;
mod runtime;
mod state_machine;
mod transport;

pub use error::NodeError;
pub use membership::Membership;
pub use memory_transport::{MemoryMesh, MemoryTransport};
pub use runtime::{now_ms, NodeCommand, NodeConfig, NodeHandle, NodeRuntime};
pub use state_machine::{NodeStateMachine, StateSnapshot};
pub use transport::{Transport, TransportError, TransportEvent};

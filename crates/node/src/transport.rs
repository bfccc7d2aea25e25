//! The transport contract consumed by the node.
//!
//! The core does not implement networking. An embedding application brings
//! a transport — WebRTC mesh, QUIC, an in-process channel — and the node
//! consumes it through this contract. Signaling and cryptographic identity
//! wrapping happen outside; a transport that authenticates peers must
//! surface the authenticated identity as the `from` of every inbound
//! message.

use async_trait::async_trait;
use lockmesh_messages::TransportMessage;
use lockmesh_types::{PeerEvent, PeerId};
use thiserror::Error;

/// Transport failures. Broadcast and send are best-effort: the node logs
/// these and continues; the transport owns reconnection and retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport is not started.
    #[error("transport not started")]
    NotStarted,

    /// The addressed peer is unknown or unreachable.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),

    /// Any other transport-level failure.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Inbound traffic from the transport, delivered over an mpsc channel the
/// embedder wires up at construction.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A message from a peer. `from` is the transport-level (authenticated)
    /// sender, which the ordering layer checks against the envelope author.
    Message {
        /// Authenticated sender.
        from: PeerId,
        /// The received message.
        message: TransportMessage,
    },

    /// A connectivity change.
    Peer(PeerEvent),
}

/// A best-effort, ordered-within-channel broadcast/unicast primitive to
/// named peers.
///
/// Messages from the same peer over the same channel arrive in order; the
/// protocol depends on this (a seal must not overtake the proposals it
/// covers). Cross-peer ordering is not required.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The local peer's identity on this transport.
    fn local_peer(&self) -> &PeerId;

    /// Join the mesh. Peers already present are reported through
    /// [`TransportEvent::Peer`] events.
    async fn start(&self) -> Result<(), TransportError>;

    /// Leave the mesh.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Fire-and-forget broadcast to every connected peer.
    async fn broadcast(&self, message: TransportMessage) -> Result<(), TransportError>;

    /// Fire-and-forget unicast.
    async fn send(&self, to: &PeerId, message: TransportMessage) -> Result<(), TransportError>;
}

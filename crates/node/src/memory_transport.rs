//! In-process transport for tests and single-process meshes.

use crate::{Transport, TransportError, TransportEvent};
use async_trait::async_trait;
use lockmesh_messages::{decode_frame, encode_frame, TransportMessage};
use lockmesh_types::{PeerEvent, PeerId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct MeshInner {
    senders: HashMap<PeerId, mpsc::UnboundedSender<TransportEvent>>,
    started: HashMap<PeerId, bool>,
}

/// An in-process mesh connecting [`MemoryTransport`] endpoints.
///
/// Messages round-trip through the binary frame codec on every hop, so the
/// full wire path is exercised even without sockets. Delivery is ordered
/// per sender (a single channel per receiver), matching the transport
/// contract.
#[derive(Clone, Default)]
pub struct MemoryMesh {
    inner: Arc<Mutex<MeshInner>>,
}

impl Default for MeshInner {
    fn default() -> Self {
        Self {
            senders: HashMap::new(),
            started: HashMap::new(),
        }
    }
}

impl MemoryMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. Returns the transport plus the event channel
    /// to hand to the node runtime.
    pub fn register(&self, peer: PeerId) -> (MemoryTransport, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("mesh lock");
        inner.senders.insert(peer.clone(), tx);
        inner.started.insert(peer.clone(), false);
        (
            MemoryTransport {
                local: peer,
                inner: Arc::clone(&self.inner),
            },
            rx,
        )
    }

    /// Deliver a raw message to one peer, bypassing the sender's transport.
    /// Test hook for malformed and spoofed traffic.
    pub fn inject(&self, from: &PeerId, to: &PeerId, message: TransportMessage) {
        let inner = self.inner.lock().expect("mesh lock");
        if let Some(tx) = inner.senders.get(to) {
            let _ = tx.send(TransportEvent::Message {
                from: from.clone(),
                message,
            });
        }
    }
}

/// One peer's endpoint on a [`MemoryMesh`].
pub struct MemoryTransport {
    local: PeerId,
    inner: Arc<Mutex<MeshInner>>,
}

impl MemoryTransport {
    fn deliver_to_started(
        &self,
        inner: &MeshInner,
        event_for: impl Fn(&PeerId) -> Option<TransportEvent>,
    ) {
        for (peer, tx) in &inner.senders {
            if *peer == self.local || !inner.started.get(peer).copied().unwrap_or(false) {
                continue;
            }
            if let Some(event) = event_for(peer) {
                let _ = tx.send(event);
            }
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn local_peer(&self) -> &PeerId {
        &self.local
    }

    async fn start(&self) -> Result<(), TransportError> {
        let mut guard = self.inner.lock().expect("mesh lock");
        let inner = &mut *guard;
        inner.started.insert(self.local.clone(), true);

        // Announce ourselves to everyone started, and learn of them.
        let local_tx = inner
            .senders
            .get(&self.local)
            .cloned()
            .ok_or(TransportError::NotStarted)?;
        for (peer, tx) in &inner.senders {
            if *peer == self.local || !inner.started.get(peer).copied().unwrap_or(false) {
                continue;
            }
            let _ = tx.send(TransportEvent::Peer(PeerEvent::Connected {
                peer: self.local.clone(),
            }));
            let _ = local_tx.send(TransportEvent::Peer(PeerEvent::Connected {
                peer: peer.clone(),
            }));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut guard = self.inner.lock().expect("mesh lock");
        let inner = &mut *guard;
        inner.started.insert(self.local.clone(), false);
        self.deliver_to_started(inner, |_| {
            Some(TransportEvent::Peer(PeerEvent::Disconnected {
                peer: self.local.clone(),
                reason: Some("stopped".to_string()),
            }))
        });
        Ok(())
    }

    async fn broadcast(&self, message: TransportMessage) -> Result<(), TransportError> {
        let bytes = encode_frame(&message).map_err(|e| TransportError::Failed(e.to_string()))?;
        let guard = self.inner.lock().expect("mesh lock");
        let inner = &*guard;
        if !inner.started.get(&self.local).copied().unwrap_or(false) {
            return Err(TransportError::NotStarted);
        }
        self.deliver_to_started(inner, |_| {
            decode_frame(&bytes).ok().map(|decoded| TransportEvent::Message {
                from: self.local.clone(),
                message: decoded,
            })
        });
        Ok(())
    }

    async fn send(&self, to: &PeerId, message: TransportMessage) -> Result<(), TransportError> {
        let bytes = encode_frame(&message).map_err(|e| TransportError::Failed(e.to_string()))?;
        let guard = self.inner.lock().expect("mesh lock");
        let inner = &*guard;
        if !inner.started.get(&self.local).copied().unwrap_or(false) {
            return Err(TransportError::NotStarted);
        }
        let tx = inner
            .senders
            .get(to)
            .filter(|_| inner.started.get(to).copied().unwrap_or(false))
            .ok_or_else(|| TransportError::UnknownPeer(to.clone()))?;
        let decoded = decode_frame(&bytes).map_err(|e| TransportError::Failed(e.to_string()))?;
        tx.send(TransportEvent::Message {
            from: self.local.clone(),
            message: decoded,
        })
        .map_err(|_| TransportError::UnknownPeer(to.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_started_peers_only() {
        let mesh = MemoryMesh::new();
        let (a, _a_rx) = mesh.register(PeerId::from("A"));
        let (b, mut b_rx) = mesh.register(PeerId::from("B"));
        let (_c, mut c_rx) = mesh.register(PeerId::from("C"));

        a.start().await.unwrap();
        b.start().await.unwrap();
        // C never starts.

        a.broadcast(TransportMessage::new("node", b"hello".to_vec()))
            .await
            .unwrap();

        // B sees the connect then the message.
        let event = b_rx.recv().await.unwrap();
        assert!(matches!(
            event,
            TransportEvent::Peer(PeerEvent::Connected { .. })
        ));
        let event = b_rx.recv().await.unwrap();
        match event {
            TransportEvent::Message { from, message } => {
                assert_eq!(from, PeerId::from("A"));
                assert_eq!(message.payload, b"hello");
                assert_eq!(message.topic, "node");
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(c_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_announces_disconnect() {
        let mesh = MemoryMesh::new();
        let (a, _a_rx) = mesh.register(PeerId::from("A"));
        let (b, mut b_rx) = mesh.register(PeerId::from("B"));

        a.start().await.unwrap();
        b.start().await.unwrap();
        let _ = b_rx.recv().await; // A connected

        a.stop().await.unwrap();
        let event = b_rx.recv().await.unwrap();
        assert!(matches!(
            event,
            TransportEvent::Peer(PeerEvent::Disconnected { .. })
        ));

        // A stopped transport refuses traffic.
        assert!(a
            .broadcast(TransportMessage::new("node", vec![]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn send_requires_known_started_peer() {
        let mesh = MemoryMesh::new();
        let (a, _a_rx) = mesh.register(PeerId::from("A"));
        a.start().await.unwrap();

        let err = a
            .send(&PeerId::from("ghost"), TransportMessage::new("node", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UnknownPeer(_)));
    }
}

//! Membership: the current set of participant identifiers.

use lockmesh_types::{PeerEvent, PeerId, PeerInfo};
use std::collections::BTreeMap;

/// The node's view of who is in the room, maintained from transport peer
/// events. The local peer is always a member.
#[derive(Debug, Clone)]
pub struct Membership {
    local: PeerInfo,
    peers: BTreeMap<PeerId, PeerInfo>,
}

impl Membership {
    /// Create a membership containing only the local peer.
    pub fn new(local: PeerInfo) -> Self {
        Self {
            local,
            peers: BTreeMap::new(),
        }
    }

    /// The local peer.
    pub fn local(&self) -> &PeerInfo {
        &self.local
    }

    /// Look up a peer (including the local one).
    pub fn get_peer(&self, id: &PeerId) -> Option<&PeerInfo> {
        if *id == self.local.id {
            return Some(&self.local);
        }
        self.peers.get(id)
    }

    /// Every member including the local peer, in canonical order.
    pub fn get_peers(&self) -> Vec<PeerInfo> {
        let mut all: Vec<PeerInfo> = self.peers.values().cloned().collect();
        all.push(self.local.clone());
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Add or replace a remote peer.
    pub fn add_peer(&mut self, info: PeerInfo) {
        if info.id != self.local.id {
            self.peers.insert(info.id.clone(), info);
        }
    }

    /// Remove a remote peer.
    pub fn remove_peer(&mut self, id: &PeerId) -> Option<PeerInfo> {
        self.peers.remove(id)
    }

    /// Apply a transport peer event.
    pub fn apply(&mut self, event: &PeerEvent) {
        match event {
            PeerEvent::Connected { peer } => self.add_peer(PeerInfo::peer(peer.clone())),
            PeerEvent::Disconnected { peer, .. } => {
                self.remove_peer(peer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_peer_events() {
        let mut membership = Membership::new(PeerInfo::peer(PeerId::from("B")));
        membership.apply(&PeerEvent::Connected {
            peer: PeerId::from("C"),
        });
        membership.apply(&PeerEvent::Connected {
            peer: PeerId::from("A"),
        });

        let peers = membership.get_peers();
        let ids: Vec<&str> = peers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(membership.get_peer(&PeerId::from("B")).is_some());

        membership.apply(&PeerEvent::Disconnected {
            peer: PeerId::from("C"),
            reason: None,
        });
        assert!(membership.get_peer(&PeerId::from("C")).is_none());

        // The local peer cannot be removed or shadowed.
        membership.add_peer(PeerInfo::peer(PeerId::from("B")));
        membership.remove_peer(&PeerId::from("B"));
        assert!(membership.get_peer(&PeerId::from("B")).is_some());
    }
}

//! The simulation runner.

use crate::{SimulatedNetwork, SimulationConfig};
use lockmesh_core::{Action, Event, EventPriority, StateMachine, TimerId};
use lockmesh_journal::{CommitJournal, MemoryJournal};
use lockmesh_node::NodeStateMachine;
use lockmesh_types::{Commit, Height, PeerId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use tracing::debug;

/// A queued event delivery.
struct Scheduled {
    due_ms: i64,
    priority: EventPriority,
    seq: u64,
    node: PeerId,
    event: Event,
    /// Timer generation; a fired timer whose generation is stale was
    /// re-armed or cancelled and is skipped.
    timer_gen: Option<u64>,
}

impl Scheduled {
    fn key(&self) -> (i64, EventPriority, u64) {
        (self.due_ms, self.priority, self.seq)
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest delivery pops
        // first.
        other.key().cmp(&self.key())
    }
}

struct SimNode<S, A> {
    machine: NodeStateMachine<S, A, MemoryJournal>,
    connected: bool,
}

/// Drives node state machines on a virtual clock.
///
/// Events pop in `(due_ms, priority, seq)` order, so two runs with the
/// same script and seed process the identical event sequence. Network
/// actions become delayed `MessageReceived` events through the seeded
/// latency model; timers become `TimerFired` events; commits never leave
/// the node machines.
pub struct SimulationRunner<S, A> {
    config: SimulationConfig,
    nodes: BTreeMap<PeerId, SimNode<S, A>>,
    queue: BinaryHeap<Scheduled>,
    network: SimulatedNetwork,
    timer_gens: HashMap<(PeerId, TimerId), u64>,
    now_ms: i64,
    next_seq: u64,
}

impl<S, A> SimulationRunner<S, A>
where
    S: Clone,
    A: Serialize + DeserializeOwned + Clone,
{
    /// Create a runner. Virtual time starts at 0.
    pub fn new(config: SimulationConfig) -> Self {
        let network = SimulatedNetwork::new(config.network.clone());
        Self {
            config,
            nodes: BTreeMap::new(),
            queue: BinaryHeap::new(),
            network,
            timer_gens: HashMap::new(),
            now_ms: 0,
            next_seq: 0,
        }
    }

    /// The room configuration the runner was built around.
    pub fn room(&self) -> &lockmesh_types::RoomConfig {
        &self.config.room
    }

    /// Current virtual time.
    pub fn now(&self) -> i64 {
        self.now_ms
    }

    /// Add a node. Its ticker starts delivering at `first_tick_at_ms`; the
    /// node is not connected to anyone until [`SimulationRunner::connect`].
    pub fn add_node(
        &mut self,
        peer: PeerId,
        mut machine: NodeStateMachine<S, A, MemoryJournal>,
        first_tick_at_ms: i64,
    ) {
        machine.start(self.now_ms);
        self.nodes.insert(
            peer.clone(),
            SimNode {
                machine,
                connected: false,
            },
        );
        self.schedule(
            peer,
            Event::TickElapsed {
                now_ms: first_tick_at_ms,
            },
            first_tick_at_ms,
            None,
        );
    }

    /// Connect a node to every currently connected node, both directions.
    pub fn connect(&mut self, peer: &PeerId) {
        let Some(node) = self.nodes.get_mut(peer) else {
            return;
        };
        if node.connected {
            return;
        }
        node.connected = true;

        let others: Vec<PeerId> = self
            .nodes
            .iter()
            .filter(|(id, n)| *id != peer && n.connected)
            .map(|(id, _)| id.clone())
            .collect();
        let now = self.now_ms;
        for other in others {
            self.schedule(
                other.clone(),
                Event::PeerConnected { peer: peer.clone() },
                now,
                None,
            );
            self.schedule(
                peer.clone(),
                Event::PeerConnected { peer: other },
                now,
                None,
            );
        }
    }

    /// Connect every node to every other.
    pub fn connect_all(&mut self) {
        let peers: Vec<PeerId> = self.nodes.keys().cloned().collect();
        for peer in peers {
            self.connect(&peer);
        }
    }

    /// Disconnect a node. Others observe the departure; the node itself
    /// keeps ticking in isolation.
    pub fn disconnect(&mut self, peer: &PeerId) {
        let Some(node) = self.nodes.get_mut(peer) else {
            return;
        };
        if !node.connected {
            return;
        }
        node.connected = false;

        let others: Vec<PeerId> = self
            .nodes
            .iter()
            .filter(|(id, n)| *id != peer && n.connected)
            .map(|(id, _)| id.clone())
            .collect();
        let now = self.now_ms;
        for other in others {
            self.schedule(
                other,
                Event::PeerDisconnected {
                    peer: peer.clone(),
                    reason: Some("simulated drop".to_string()),
                },
                now,
                None,
            );
        }
    }

    /// Stop a node's machine in place: it stays connected but goes silent.
    /// Models a stalled participant blocking the barrier.
    pub fn pause(&mut self, peer: &PeerId) {
        if let Some(node) = self.nodes.get_mut(peer) {
            node.machine.stop();
        }
    }

    /// Schedule a local submission at a point in virtual time.
    pub fn submit_at(&mut self, peer: &PeerId, action: &A, at_ms: i64) {
        let payload = serde_json::to_value(action).expect("action must encode");
        self.schedule(
            peer.clone(),
            Event::LocalAction {
                payload,
                now_ms: at_ms,
            },
            at_ms,
            None,
        );
    }

    /// A node's machine.
    pub fn node(&self, peer: &PeerId) -> &NodeStateMachine<S, A, MemoryJournal> {
        &self.nodes[peer].machine
    }

    /// A node's full commit log.
    pub fn commits(&self, peer: &PeerId) -> Vec<Commit> {
        let journal = self.nodes[peer].machine.journal();
        let latest = journal.latest_height().expect("memory journal");
        journal
            .get_range(Height(1), latest)
            .expect("memory journal")
    }

    /// Run the simulation up to (and including) `until_ms`.
    pub fn run_until(&mut self, until_ms: i64) {
        while let Some(head) = self.queue.peek() {
            if head.due_ms > until_ms {
                break;
            }
            let scheduled = self.queue.pop().expect("peeked");
            if scheduled.due_ms > self.now_ms {
                self.now_ms = scheduled.due_ms;
            }

            // Drop stale timer fires (re-armed or cancelled since).
            if let Some(generation) = scheduled.timer_gen {
                let Event::TimerFired { timer } = &scheduled.event else {
                    continue;
                };
                let current = self
                    .timer_gens
                    .get(&(scheduled.node.clone(), timer.clone()));
                if current != Some(&generation) {
                    continue;
                }
            }

            let is_tick = matches!(scheduled.event, Event::TickElapsed { .. });
            let actions = {
                let Some(node) = self.nodes.get_mut(&scheduled.node) else {
                    continue;
                };
                // A disconnected node receives no network traffic; its
                // clock keeps running.
                if !node.connected && matches!(scheduled.event, Event::MessageReceived { .. }) {
                    continue;
                }
                node.machine.set_time(scheduled.due_ms);
                node.machine.handle(scheduled.event)
            };

            let from = scheduled.node;
            if is_tick {
                let due = scheduled.due_ms + self.config.tick_interval_ms;
                self.schedule(from.clone(), Event::TickElapsed { now_ms: due }, due, None);
            }
            self.route(from, actions);
        }

        if until_ms > self.now_ms {
            self.now_ms = until_ms;
        }
    }

    /// Execute a node's outbound actions against the simulated network.
    fn route(&mut self, from: PeerId, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Broadcast { message } => {
                    if !self.is_connected(&from) {
                        continue;
                    }
                    let targets: Vec<PeerId> = self
                        .nodes
                        .iter()
                        .filter(|(id, n)| **id != from && n.connected)
                        .map(|(id, _)| id.clone())
                        .collect();
                    for to in targets {
                        let due = self.network.delivery_time(&from, &to, self.now_ms);
                        self.schedule(
                            to,
                            Event::MessageReceived {
                                from: from.clone(),
                                message: message.clone(),
                            },
                            due,
                            None,
                        );
                    }
                }
                Action::Send { to, message } => {
                    if !self.is_connected(&from) || !self.is_connected(&to) {
                        continue;
                    }
                    let due = self.network.delivery_time(&from, &to, self.now_ms);
                    self.schedule(
                        to,
                        Event::MessageReceived {
                            from: from.clone(),
                            message,
                        },
                        due,
                        None,
                    );
                }
                Action::StartTimer { timer, after_ms } => {
                    let generation = self
                        .timer_gens
                        .entry((from.clone(), timer.clone()))
                        .or_insert(0);
                    *generation += 1;
                    let generation = *generation;
                    let due = self.now_ms + after_ms.max(0);
                    self.schedule(
                        from.clone(),
                        Event::TimerFired { timer },
                        due,
                        Some(generation),
                    );
                }
                Action::CancelTimer { timer } => {
                    *self
                        .timer_gens
                        .entry((from.clone(), timer))
                        .or_insert(0) += 1;
                }
                Action::CommitReady { commit } => {
                    // Node machines consume commits internally; nothing to
                    // route.
                    debug!(height = %commit.height, "Stray commit action ignored");
                }
            }
        }
    }

    fn is_connected(&self, peer: &PeerId) -> bool {
        self.nodes.get(peer).is_some_and(|n| n.connected)
    }

    fn schedule(&mut self, node: PeerId, event: Event, due_ms: i64, timer_gen: Option<u64>) {
        let priority = event.priority();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled {
            due_ms,
            priority,
            seq,
            node,
            event,
            timer_gen,
        });
    }
}

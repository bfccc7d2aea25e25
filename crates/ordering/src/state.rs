//! Lockstep ordering state machine implementation.
//!
//! The machine owns the proposal and seal buffers, the eligibility map, and
//! the committed frontier. All buffers are `BTreeMap`s so iteration order —
//! and therefore commit content — is canonical on every peer.

use crate::OrderingConfig;
use lockmesh_core::{Action, Event, StateMachine, TimerId};
use lockmesh_messages::NodeMessage;
use lockmesh_types::{Commit, Height, PeerId, RoomConfig, SignedAction, Tick, TickClock};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The hostless lockstep ordering engine for one room.
///
/// Synchronous and deterministic: inputs arrive as [`Event`]s, outputs are
/// returned as [`Action`]s, and the runner performs all I/O. Wall time is
/// injected through events (and [`LockstepOrdering::set_time`] for message
/// handling), never read from the environment.
#[derive(Debug)]
pub struct LockstepOrdering {
    /// Our own identity; always eligible, never in `first_eligible`.
    local: PeerId,

    /// Shared room parameters.
    room: RoomConfig,

    /// Local tunables.
    config: OrderingConfig,

    /// The live clock. Its origin moves only forward, under warp.
    clock: TickClock,

    /// Lifecycle flag; a stopped machine drops every event.
    running: bool,

    /// Latest wall time observed through any input.
    now_ms: i64,

    /// The tick the local clock is in. `Tick::UNSTARTED` before the first
    /// tick advance.
    current_tick: Tick,

    /// Last committed ordering tick.
    committed_tick: Tick,

    /// Height of the last emitted commit.
    height: Height,

    /// Proposal buffer: tick → author → seq → payload. Entries for a tick
    /// are freed when it commits.
    proposals: BTreeMap<Tick, BTreeMap<PeerId, BTreeMap<i64, serde_json::Value>>>,

    /// Seal records: tick → peer → declared last seq (−1 for none).
    seals: BTreeMap<Tick, BTreeMap<PeerId, i64>>,

    /// First tick each remote peer must seal. Absence means the peer is
    /// not connected.
    first_eligible: BTreeMap<PeerId, Tick>,

    /// Next local seq per target tick.
    local_next_seq: BTreeMap<Tick, i64>,
}

impl LockstepOrdering {
    /// Create a machine for `local` in the given room.
    pub fn new(local: PeerId, room: RoomConfig) -> Self {
        Self::with_config(local, room, OrderingConfig::default())
    }

    /// Create a machine with explicit ordering tunables.
    pub fn with_config(local: PeerId, room: RoomConfig, config: OrderingConfig) -> Self {
        let clock = TickClock::from_room(&room);
        Self {
            local,
            room,
            config,
            clock,
            running: false,
            now_ms: i64::MIN,
            current_tick: Tick::UNSTARTED,
            committed_tick: Tick::UNSTARTED,
            height: Height::ZERO,
            proposals: BTreeMap::new(),
            seals: BTreeMap::new(),
            first_eligible: BTreeMap::new(),
            local_next_seq: BTreeMap::new(),
        }
    }

    /// Begin processing events. Idempotent.
    pub fn start(&mut self, now_ms: i64) -> Vec<Action> {
        if self.running {
            return vec![];
        }
        self.running = true;
        self.set_time(now_ms);
        info!(room = %self.room.room_id, peer = %self.local, "Lockstep ordering started");
        vec![]
    }

    /// Stop processing events. Idempotent; buffers are retained so a
    /// restart resumes where it left off.
    pub fn stop(&mut self) -> Vec<Action> {
        if self.running {
            self.running = false;
            info!(room = %self.room.room_id, peer = %self.local, "Lockstep ordering stopped");
        }
        vec![]
    }

    /// Inject the current wall time. Runners call this before delivering
    /// events that carry no timestamp of their own (messages, timers).
    pub fn set_time(&mut self, now_ms: i64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }

    /// Whether the machine is processing events.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The tick the local clock is in.
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// The last committed ordering tick.
    pub fn committed_tick(&self) -> Tick {
        self.committed_tick
    }

    /// Height of the last emitted commit.
    pub fn latest_height(&self) -> Height {
        self.height
    }

    /// Every known participant: the local peer plus connected remotes, in
    /// canonical order.
    pub fn peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.first_eligible.keys().cloned().collect();
        peers.push(self.local.clone());
        peers.sort();
        peers
    }

    /// The live clock.
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// The room configuration.
    pub fn room(&self) -> &RoomConfig {
        &self.room
    }

    /// The tick an action submitted at `now_ms` would target.
    pub fn input_target(&self, now_ms: i64) -> Tick {
        Tick(self.clock.tick_at(now_ms).0 + self.room.input_delay_ticks)
    }

    /// First tick `peer` is expected to seal, when connected.
    pub fn first_eligible(&self, peer: &PeerId) -> Option<Tick> {
        self.first_eligible.get(peer).copied()
    }

    /// Restore the committed frontier after journal recovery. Must be
    /// called before the machine starts; the frontier only moves forward.
    pub fn resume(&mut self, committed_tick: Tick, height: Height) {
        if committed_tick > self.committed_tick {
            self.committed_tick = committed_tick;
        }
        if height > self.height {
            self.height = height;
        }
    }

    /// The newest tick the local peer has sealed (or will have sealed on
    /// entering the current tick).
    fn seal_horizon(&self) -> Tick {
        Tick(self.current_tick.0 - 1 + self.room.input_delay_ticks)
    }

    /// Advance the clock to the tick containing `now_ms`, sealing each
    /// horizon crossed, then push the committed frontier as far as the
    /// barrier allows.
    fn advance(&mut self, now_ms: i64) -> Vec<Action> {
        self.set_time(now_ms);
        let target = self.clock.tick_at(now_ms);
        if !target.is_started() {
            return vec![];
        }

        let mut actions = Vec::new();
        if self.current_tick == Tick::UNSTARTED {
            // First observed tick. Earlier ticks never existed on this
            // peer, so the committed frontier clamps to just below the
            // first sealed horizon.
            self.current_tick = target;
            let horizon = self.seal_horizon();
            actions.extend(self.seal_local(horizon));
            if self.committed_tick < horizon.prev() {
                self.committed_tick = horizon.prev();
            }
            debug!(
                tick = %self.current_tick,
                horizon = %horizon,
                "Clock started"
            );
        } else {
            while self.current_tick < target {
                self.current_tick = self.current_tick.next();
                let horizon = self.seal_horizon();
                actions.extend(self.seal_local(horizon));
            }
        }

        actions.extend(self.advance_commits());
        actions
    }

    /// Record and broadcast the local seal for `tick`. Idempotent.
    fn seal_local(&mut self, tick: Tick) -> Vec<Action> {
        if !tick.is_started() {
            return vec![];
        }
        let by_peer = self.seals.entry(tick).or_default();
        if by_peer.contains_key(&self.local) {
            return vec![];
        }

        let last_seq = self.local_next_seq.get(&tick).map_or(-1, |next| next - 1);
        by_peer.insert(self.local.clone(), last_seq);
        debug!(%tick, last_seq, "Sealed tick");

        vec![Action::Broadcast {
            message: NodeMessage::ActionSeal {
                room_id: self.room.room_id.clone(),
                peer_id: self.local.clone(),
                tick,
                last_seq,
            },
        }]
    }

    /// Buffer a locally submitted action and broadcast its proposal.
    fn on_local_action(&mut self, payload: serde_json::Value, now_ms: i64) -> Vec<Action> {
        self.set_time(now_ms);
        let target = self.input_target(now_ms);

        if target <= self.committed_tick {
            warn!(%target, committed = %self.committed_tick, "Local action targets committed tick; dropped");
            return vec![];
        }
        if self.current_tick.is_started() && target <= self.seal_horizon() {
            warn!(%target, horizon = %self.seal_horizon(), "Local action targets sealed tick; dropped");
            return vec![];
        }

        let next_seq = self.local_next_seq.entry(target).or_insert(0);
        let seq = *next_seq;
        *next_seq += 1;

        self.proposals
            .entry(target)
            .or_default()
            .entry(self.local.clone())
            .or_default()
            .insert(seq, payload.clone());

        debug!(%target, seq, "Local action proposed");
        vec![Action::Broadcast {
            message: NodeMessage::ActionPropose {
                room_id: self.room.room_id.clone(),
                peer_id: self.local.clone(),
                tick: target,
                seq,
                payload,
            },
        }]
    }

    /// Dispatch an inbound protocol message.
    fn on_message(&mut self, from: PeerId, message: NodeMessage) -> Vec<Action> {
        if message.room_id() != self.room.room_id {
            debug!(
                room = message.room_id(),
                kind = message.type_name(),
                "Message for foreign room; dropped"
            );
            return vec![];
        }
        if let Some(author) = message.peer_id() {
            if *author != from {
                warn!(%from, author = %author, kind = message.type_name(), "Spoofed sender; dropped");
                return vec![];
            }
        }

        match message {
            NodeMessage::ActionPropose {
                peer_id,
                tick,
                seq,
                payload,
                ..
            } => self.on_propose(peer_id, tick, seq, payload),
            NodeMessage::ActionSeal {
                peer_id,
                tick,
                last_seq,
                ..
            } => self.on_seal(peer_id, tick, last_seq),
            NodeMessage::ActionCommit { tick, height, .. } => {
                // Advisory gossip; commits are recomputed locally.
                debug!(%tick, %height, "Commit gossip received; ignored");
                vec![]
            }
            NodeMessage::SyncClock { tick, .. } => self.on_sync_clock(from, tick),
        }
    }

    fn on_propose(
        &mut self,
        peer: PeerId,
        tick: Tick,
        seq: i64,
        payload: serde_json::Value,
    ) -> Vec<Action> {
        if tick <= self.committed_tick {
            debug!(%peer, %tick, seq, "Late proposal; dropped");
            return vec![];
        }

        let by_seq = self
            .proposals
            .entry(tick)
            .or_default()
            .entry(peer.clone())
            .or_default();
        if by_seq.contains_key(&seq) {
            debug!(%peer, %tick, seq, "Duplicate proposal; dropped");
            return vec![];
        }
        by_seq.insert(seq, payload);
        vec![]
    }

    fn on_seal(&mut self, peer: PeerId, tick: Tick, last_seq: i64) -> Vec<Action> {
        if tick <= self.committed_tick {
            debug!(%peer, %tick, "Late seal; dropped");
            return vec![];
        }

        let by_peer = self.seals.entry(tick).or_default();
        if let Some(existing) = by_peer.get(&peer) {
            if *existing != last_seq {
                warn!(%peer, %tick, existing, last_seq, "Conflicting re-seal; keeping first");
            }
            return vec![];
        }

        let buffered_max = self
            .proposals
            .get(&tick)
            .and_then(|by_author| by_author.get(&peer))
            .and_then(|by_seq| by_seq.keys().next_back())
            .copied()
            .unwrap_or(-1);
        if last_seq > buffered_max {
            // Per-sender channel order should deliver proposals before the
            // seal that covers them.
            warn!(%peer, %tick, last_seq, buffered_max, "Seal covers unseen proposals");
        }

        by_peer.insert(peer, last_seq);
        self.advance_commits()
    }

    /// Warp forward when a peer reports a higher tick than ours.
    fn on_sync_clock(&mut self, from: PeerId, remote: Tick) -> Vec<Action> {
        if remote <= self.current_tick {
            debug!(%from, %remote, current = %self.current_tick, "Clock hint not ahead; ignored");
            return vec![];
        }

        info!(%from, %remote, current = %self.current_tick, "Clock behind; warping forward");
        self.clock.warp(remote, self.now_ms);
        self.current_tick = remote;

        let mut actions = Vec::new();
        let horizon = self.seal_horizon();
        let mut tick = Tick(0);
        while tick <= horizon {
            actions.extend(self.seal_local(tick));
            tick = tick.next();
        }

        let lifted = Tick(self.current_tick.0 + self.room.input_delay_ticks);
        for first in self.first_eligible.values_mut() {
            if *first < lifted {
                *first = lifted;
            }
        }

        actions.extend(self.advance_commits());
        actions
    }

    fn on_peer_connected(&mut self, peer: PeerId) -> Vec<Action> {
        if peer == self.local {
            return vec![];
        }

        let first = if self.current_tick == Tick::UNSTARTED {
            Tick(self.room.input_delay_ticks)
        } else {
            Tick(self.current_tick.0 + self.room.input_delay_ticks)
        };
        self.first_eligible.insert(peer.clone(), first);
        info!(%peer, first_eligible = %first, "Peer connected");

        vec![Action::StartTimer {
            timer: TimerId::ClockSync { peer },
            after_ms: self.config.clock_sync_settle_ms,
        }]
    }

    fn on_peer_disconnected(&mut self, peer: PeerId) -> Vec<Action> {
        if self.first_eligible.remove(&peer).is_none() {
            return vec![];
        }
        info!(%peer, "Peer disconnected");

        let mut actions = vec![Action::CancelTimer {
            timer: TimerId::ClockSync { peer },
        }];
        // Removing a blocker's eligibility may satisfy a stalled barrier.
        actions.extend(self.advance_commits());
        actions
    }

    fn on_timer(&mut self, timer: TimerId) -> Vec<Action> {
        match timer {
            TimerId::ClockSync { peer } => {
                if !self.first_eligible.contains_key(&peer) || !self.current_tick.is_started() {
                    return vec![];
                }
                vec![Action::Send {
                    to: peer,
                    message: NodeMessage::SyncClock {
                        room_id: self.room.room_id.clone(),
                        peer_id: self.local.clone(),
                        tick: self.current_tick,
                    },
                }]
            }
        }
    }

    /// Commit every tick in `(committed, horizon]` whose barrier is
    /// satisfied, stopping at the first that is not (head-of-line).
    fn advance_commits(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.current_tick.is_started() {
            return actions;
        }

        let horizon = self.seal_horizon();
        while self.committed_tick < horizon {
            let next = self.committed_tick.next();
            if !self.barrier_satisfied(next) {
                break;
            }
            actions.extend(self.commit_tick(next));
        }
        actions
    }

    /// Whether every peer eligible at `tick` has a recorded seal for it.
    fn barrier_satisfied(&self, tick: Tick) -> bool {
        let Some(sealed) = self.seals.get(&tick) else {
            return false;
        };
        if !sealed.contains_key(&self.local) {
            return false;
        }
        self.first_eligible
            .iter()
            .all(|(peer, first)| *first > tick || sealed.contains_key(peer))
    }

    /// Emit the commit for `tick` and free its buffers.
    fn commit_tick(&mut self, tick: Tick) -> Vec<Action> {
        let mut eligible: Vec<&PeerId> = self
            .first_eligible
            .iter()
            .filter(|(_, first)| **first <= tick)
            .map(|(peer, _)| peer)
            .collect();
        eligible.push(&self.local);
        eligible.sort();

        let mut flattened = Vec::new();
        if let Some(by_author) = self.proposals.get(&tick) {
            for peer in &eligible {
                if let Some(by_seq) = by_author.get(*peer) {
                    for (seq, payload) in by_seq {
                        flattened.push(SignedAction {
                            peer: (*peer).clone(),
                            seq: *seq,
                            payload: payload.clone(),
                        });
                    }
                }
            }
        }

        self.height = self.height.next();
        self.committed_tick = tick;
        let commit = Commit {
            height: self.height,
            tick,
            actions: flattened,
        };

        // Free everything at or below the committed tick.
        self.proposals = self.proposals.split_off(&tick.next());
        self.seals = self.seals.split_off(&tick.next());
        self.local_next_seq = self.local_next_seq.split_off(&tick.next());

        info!(
            height = %commit.height,
            %tick,
            actions = commit.actions.len(),
            "Tick committed"
        );

        vec![
            Action::CommitReady {
                commit: commit.clone(),
            },
            Action::Broadcast {
                message: NodeMessage::ActionCommit {
                    room_id: self.room.room_id.clone(),
                    tick,
                    height: commit.height,
                    actions: commit.actions,
                },
            },
        ]
    }
}

impl StateMachine for LockstepOrdering {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        if !self.running {
            debug!(kind = event.type_name(), "Machine stopped; event dropped");
            return vec![];
        }

        match event {
            Event::TickElapsed { now_ms } => self.advance(now_ms),
            Event::LocalAction { payload, now_ms } => self.on_local_action(payload, now_ms),
            Event::MessageReceived { from, message } => self.on_message(from, message),
            Event::PeerConnected { peer } => self.on_peer_connected(peer),
            Event::PeerDisconnected { peer, .. } => self.on_peer_disconnected(peer),
            Event::TimerFired { timer } => self.on_timer(timer),
        }
    }
}

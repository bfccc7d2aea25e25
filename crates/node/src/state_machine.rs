//! The synchronous node state machine.

use crate::Membership;
use lockmesh_core::{Action, Event, StateMachine};
use lockmesh_engine::Engine;
use lockmesh_journal::{CommitJournal, JournalError};
use lockmesh_messages::NodeMessage;
use lockmesh_ordering::LockstepOrdering;
use lockmesh_types::{
    ActionMeta, Commit, Height, PeerId, PeerInfo, RoomConfig, Tick,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

/// Published view of a node's state for subscribers.
#[derive(Debug, Clone)]
pub struct StateSnapshot<S> {
    /// Optimistic state: authoritative plus locally pending actions.
    pub state: S,
    /// Last committed ordering tick.
    pub committed_tick: Tick,
    /// The tick the local clock is in.
    pub current_tick: Tick,
    /// Height of the last commit the pipeline processed.
    pub height: Height,
    /// Locally submitted actions not yet covered by a commit.
    pub pending: usize,
    /// Monotonic change counter; bumps on every visible change.
    pub version: u64,
}

/// A locally submitted action awaiting its commit.
#[derive(Debug, Clone)]
struct PendingAction<A> {
    temp_id: u64,
    target: Tick,
    action: A,
}

/// Ordering, engine, and journal composed into one deterministic machine.
///
/// Holds two state references: the **authoritative** state built only from
/// committed actions plus scheduler catch-up, and the **optimistic** state —
/// authoritative with pending local actions re-applied. Commits flow
/// through the pipeline inline; the machine's caller only ever sees
/// network and timer actions.
pub struct NodeStateMachine<S, A, J> {
    local: PeerId,
    ordering: LockstepOrdering,
    engine: Engine<S, A>,
    journal: J,
    membership: Membership,
    authoritative: S,
    optimistic: S,
    pending: VecDeque<PendingAction<A>>,
    last_scheduler_tick: Tick,
    processed_height: Height,
    next_temp_id: u64,
    version: u64,
    halted: bool,
}

impl<S, A, J> NodeStateMachine<S, A, J>
where
    S: Clone,
    A: Serialize + DeserializeOwned + Clone,
    J: CommitJournal,
{
    /// Create a machine, replaying any commits already in the journal.
    ///
    /// Recovery rebuilds the authoritative state from the journal and
    /// resumes the ordering frontier at the recovered height, so a durable
    /// node continues exactly where the previous process stopped.
    pub fn new(
        local: PeerId,
        room: RoomConfig,
        engine: Engine<S, A>,
        journal: J,
    ) -> Result<Self, JournalError> {
        let mut ordering = LockstepOrdering::new(local.clone(), room);
        let mut authoritative = engine.initial_state();
        let mut last_scheduler_tick = Tick::UNSTARTED;

        let recovered = journal.latest_height()?;
        if recovered > Height::ZERO {
            let commits = journal.get_range(Height(1), recovered)?;
            for commit in &commits {
                let (state, caught_up) =
                    reduce_commit(&engine, authoritative, last_scheduler_tick, commit);
                authoritative = state;
                last_scheduler_tick = caught_up;
            }
            if let Some(last) = commits.last() {
                ordering.resume(last.tick, last.height);
                info!(
                    height = %last.height,
                    tick = %last.tick,
                    "Recovered from journal"
                );
            }
        }

        let optimistic = authoritative.clone();
        Ok(Self {
            membership: Membership::new(PeerInfo::peer(local.clone())),
            local,
            ordering,
            engine,
            journal,
            authoritative,
            optimistic,
            pending: VecDeque::new(),
            last_scheduler_tick,
            processed_height: recovered,
            next_temp_id: 0,
            version: 0,
            halted: false,
        })
    }

    /// Start the underlying ordering machine. Idempotent.
    pub fn start(&mut self, now_ms: i64) -> Vec<Action> {
        self.ordering.start(now_ms)
    }

    /// Stop the underlying ordering machine. Idempotent.
    pub fn stop(&mut self) -> Vec<Action> {
        self.ordering.stop()
    }

    /// Inject the current wall time before timestamp-free events.
    pub fn set_time(&mut self, now_ms: i64) {
        self.ordering.set_time(now_ms);
    }

    /// Submit a local action: optimistically apply, remember it as pending,
    /// and hand it to the ordering layer for proposal.
    pub fn submit(&mut self, action: A, now_ms: i64) -> Vec<Action> {
        let payload = match self.engine.encode_action(&action) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Submitted action could not be encoded; dropped");
                return vec![];
            }
        };

        let target = self.ordering.input_target(now_ms);
        let out = self.ordering.handle(Event::LocalAction { payload, now_ms });

        // The ordering layer drops late submissions silently; only track
        // what it actually proposed.
        let accepted = out.iter().any(|a| {
            matches!(
                a,
                Action::Broadcast {
                    message: NodeMessage::ActionPropose { .. }
                }
            )
        });
        if accepted {
            let temp_id = self.next_temp_id;
            self.next_temp_id += 1;

            let meta = ActionMeta {
                from: self.local.clone(),
                tick: target,
                height: None,
            };
            if self.engine.is_legal(&self.optimistic, &action, &meta).is_ok() {
                self.optimistic = self.engine.reduce(&self.optimistic, &action, &meta);
            } else {
                debug!(temp_id, "Optimistic apply rejected; relying on commit");
            }

            self.pending.push_back(PendingAction {
                temp_id,
                target,
                action,
            });
            self.version += 1;
        }

        self.drain(out)
    }

    /// Current snapshot for subscribers.
    pub fn snapshot(&self) -> StateSnapshot<S> {
        StateSnapshot {
            state: self.optimistic.clone(),
            committed_tick: self.ordering.committed_tick(),
            current_tick: self.ordering.current_tick(),
            height: self.processed_height,
            pending: self.pending.len(),
            version: self.version,
        }
    }

    /// The authoritative (committed-only) state.
    pub fn authoritative_state(&self) -> &S {
        &self.authoritative
    }

    /// The optimistic state.
    pub fn optimistic_state(&self) -> &S {
        &self.optimistic
    }

    /// Number of locally submitted actions not yet committed.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the commit pipeline halted on a fatal journal error.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Monotonic change counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The underlying ordering machine.
    pub fn ordering(&self) -> &LockstepOrdering {
        &self.ordering
    }

    /// The journal.
    pub fn journal(&self) -> &J {
        &self.journal
    }

    /// Mutable journal access, for maintenance and tests.
    pub fn journal_mut(&mut self) -> &mut J {
        &mut self.journal
    }

    /// The membership view.
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// The engine.
    pub fn engine(&self) -> &Engine<S, A> {
        &self.engine
    }

    /// Pull `CommitReady` actions through the commit pipeline; everything
    /// else passes through to the caller.
    fn drain(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::CommitReady { commit } => self.process_commit(commit),
                other => out.push(other),
            }
        }
        out
    }

    /// The serialized post-commit pipeline: journal, reduce, scheduler
    /// catch-up, pending reconciliation, snapshot bump.
    fn process_commit(&mut self, commit: Commit) {
        if self.halted {
            error!(height = %commit.height, "Commit pipeline halted; commit dropped");
            return;
        }

        if let Err(e) = self.journal.append(&commit) {
            error!(
                height = %commit.height,
                error = %e,
                "Journal append failed; halting commit pipeline"
            );
            self.halted = true;
            return;
        }

        let local_count = commit
            .actions
            .iter()
            .filter(|a| a.peer == self.local)
            .count();

        let (state, caught_up) = reduce_commit(
            &self.engine,
            self.authoritative.clone(),
            self.last_scheduler_tick,
            &commit,
        );
        self.authoritative = state;
        self.last_scheduler_tick = caught_up;
        self.processed_height = commit.height;

        // Local actions commit in submission order (seq is monotonic and
        // per-author order is preserved), so the first N pending entries
        // are the ones this commit covers.
        for _ in 0..local_count {
            self.pending.pop_front();
        }

        self.rebuild_optimistic();
        self.version += 1;
    }

    /// Optimistic = authoritative + replay of remaining pending actions.
    /// A pending action that no longer applies is discarded.
    fn rebuild_optimistic(&mut self) {
        let engine = &self.engine;
        let local = &self.local;
        let mut state = self.authoritative.clone();

        self.pending.retain(|pending| {
            let meta = ActionMeta {
                from: local.clone(),
                tick: pending.target,
                height: None,
            };
            match engine.is_legal(&state, &pending.action, &meta) {
                Ok(()) => {
                    state = engine.reduce(&state, &pending.action, &meta);
                    true
                }
                Err(violation) => {
                    warn!(
                        temp_id = pending.temp_id,
                        %violation,
                        "Pending action diverged from committed state; dropped"
                    );
                    false
                }
            }
        });

        self.optimistic = state;
    }
}

/// Reduce one commit into `state`: each signed action through the rule and
/// systems, then scheduler catch-up through the commit's tick.
fn reduce_commit<S, A>(
    engine: &Engine<S, A>,
    state: S,
    last_scheduler_tick: Tick,
    commit: &Commit,
) -> (S, Tick)
where
    S: Clone,
    A: Serialize + DeserializeOwned,
{
    let mut next = state;
    for signed in &commit.actions {
        let meta = ActionMeta {
            from: signed.peer.clone(),
            tick: commit.tick,
            height: Some(commit.height),
        };
        match engine.decode_action(&signed.payload) {
            Ok(action) => {
                next = engine.reduce(&next, &action, &meta);
            }
            Err(e) => {
                warn!(
                    from = %signed.peer,
                    tick = %commit.tick,
                    error = %e,
                    "Undecodable committed action skipped"
                );
            }
        }
    }

    let caught_up = engine.run_schedulers(next, last_scheduler_tick, commit.tick);
    (caught_up, commit.tick)
}

impl<S, A, J> StateMachine for NodeStateMachine<S, A, J>
where
    S: Clone,
    A: Serialize + DeserializeOwned + Clone,
    J: CommitJournal,
{
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::LocalAction { payload, now_ms } => match self.engine.decode_action(&payload) {
                Ok(action) => self.submit(action, now_ms),
                Err(e) => {
                    warn!(error = %e, "Local payload could not be decoded; dropped");
                    vec![]
                }
            },
            other => {
                if let Event::PeerConnected { peer } = &other {
                    self.membership.add_peer(PeerInfo::peer(peer.clone()));
                }
                if let Event::PeerDisconnected { peer, .. } = &other {
                    self.membership.remove_peer(peer);
                }
                let actions = self.ordering.handle(other);
                self.drain(actions)
            }
        }
    }
}

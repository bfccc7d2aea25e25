//! The tokio driver around [`NodeStateMachine`].

use crate::{NodeError, NodeStateMachine, StateSnapshot, Transport, TransportEvent};
use lockmesh_core::{Action, Event, StateMachine, TimerId};
use lockmesh_journal::CommitJournal;
use lockmesh_messages::{decode_envelope, encode_envelope, TransportMessage, NODE_TOPIC};
use lockmesh_types::PeerEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::poll_fn;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tokio_util::time::delay_queue::Key;
use tokio_util::time::DelayQueue;
use tracing::{debug, warn};

/// Wall clock in epoch milliseconds, as injected into the state machine.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Runtime tunables.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interval between `TickElapsed` deliveries to the machine.
    pub tick_interval_ms: u64,
    /// Capacity of the command channel behind [`NodeHandle`].
    pub command_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            command_capacity: 64,
        }
    }
}

impl NodeConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticker interval.
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }
}

/// Commands accepted by a running node.
#[derive(Debug)]
pub enum NodeCommand<A> {
    /// Submit a local action.
    Submit(A),
    /// Stop the runtime.
    Shutdown,
}

/// Cheap cloneable handle to a running node.
#[derive(Debug, Clone)]
pub struct NodeHandle<S, A> {
    commands: mpsc::Sender<NodeCommand<A>>,
    snapshots: watch::Receiver<StateSnapshot<S>>,
}

impl<S: Clone, A> NodeHandle<S, A> {
    /// Submit a local action to the node.
    pub async fn submit(&self, action: A) -> Result<(), NodeError> {
        self.commands
            .send(NodeCommand::Submit(action))
            .await
            .map_err(|_| NodeError::Stopped)
    }

    /// Subscribe to state snapshots. The receiver always holds the latest.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot<S>> {
        self.snapshots.clone()
    }

    /// Ask the runtime to stop. Returns once the command is queued.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(NodeCommand::Shutdown).await;
    }
}

/// One tokio task owning a [`NodeStateMachine`] and its I/O.
///
/// The single task is the commit-pipeline serialization: every event —
/// ticker, transport, command, timer — is processed to completion
/// (including any commits it releases) before the next is taken.
pub struct NodeRuntime<S, A, T, J> {
    machine: NodeStateMachine<S, A, J>,
    transport: Arc<T>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    commands: mpsc::Receiver<NodeCommand<A>>,
    snapshots: watch::Sender<StateSnapshot<S>>,
    config: NodeConfig,
}

impl<S, A, T, J> NodeRuntime<S, A, T, J>
where
    S: Clone + Send + Sync + 'static,
    A: Serialize + DeserializeOwned + Clone + Send + 'static,
    T: Transport,
    J: CommitJournal + Send + 'static,
{
    /// Wrap a machine and a transport into a runnable runtime plus its
    /// handle. `events` is the inbound channel the transport was built
    /// around.
    pub fn new(
        machine: NodeStateMachine<S, A, J>,
        transport: Arc<T>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        config: NodeConfig,
    ) -> (Self, NodeHandle<S, A>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let runtime = Self {
            machine,
            transport,
            events,
            commands: command_rx,
            snapshots: snapshot_tx,
            config,
        };
        let handle = NodeHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runtime, handle)
    }

    /// Drive the node until shutdown. Consumes the runtime.
    pub async fn run(self) -> Result<(), NodeError> {
        let Self {
            mut machine,
            transport,
            mut events,
            mut commands,
            snapshots,
            config,
        } = self;

        transport.start().await?;
        machine.start(now_ms());

        let mut ticker =
            tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
        let mut timers: DelayQueue<TimerId> = DelayQueue::new();
        let mut timer_keys: HashMap<TimerId, Key> = HashMap::new();
        let mut published_version = u64::MAX;

        loop {
            enum Input<A> {
                Tick,
                Transport(TransportEvent),
                Command(Option<NodeCommand<A>>),
                Timer(TimerId),
            }

            let input = tokio::select! {
                _ = ticker.tick() => Input::Tick,
                event = events.recv() => match event {
                    Some(event) => Input::Transport(event),
                    // Transport event stream closed: treat as shutdown.
                    None => Input::Command(Some(NodeCommand::Shutdown)),
                },
                command = commands.recv() => Input::Command(command),
                // Resolves None when no timer is armed; the failed pattern
                // disables the branch for this round.
                Some(expired) = poll_fn(|cx| timers.poll_expired(cx)) => {
                    Input::Timer(expired.into_inner())
                }
            };

            let now = now_ms();
            machine.set_time(now);

            let actions = match input {
                Input::Tick => machine.handle(Event::TickElapsed { now_ms: now }),
                Input::Transport(TransportEvent::Message { from, message }) => {
                    if message.topic != NODE_TOPIC {
                        debug!(topic = %message.topic, "Message on foreign topic; dropped");
                        continue;
                    }
                    match decode_envelope(&message.payload) {
                        Ok(decoded) => machine.handle(Event::MessageReceived {
                            from,
                            message: decoded,
                        }),
                        Err(e) => {
                            warn!(%from, error = %e, "Undecodable frame; dropped");
                            continue;
                        }
                    }
                }
                Input::Transport(TransportEvent::Peer(PeerEvent::Connected { peer })) => {
                    machine.handle(Event::PeerConnected { peer })
                }
                Input::Transport(TransportEvent::Peer(PeerEvent::Disconnected {
                    peer,
                    reason,
                })) => machine.handle(Event::PeerDisconnected { peer, reason }),
                Input::Command(Some(NodeCommand::Submit(action))) => machine.submit(action, now),
                Input::Command(Some(NodeCommand::Shutdown)) | Input::Command(None) => break,
                Input::Timer(timer) => {
                    timer_keys.remove(&timer);
                    machine.handle(Event::TimerFired { timer })
                }
            };

            execute_actions(&*transport, &mut timers, &mut timer_keys, actions, now).await;

            if machine.version() != published_version {
                published_version = machine.version();
                let _ = snapshots.send_replace(machine.snapshot());
            }
        }

        machine.stop();
        transport.stop().await?;
        Ok(())
    }
}

/// Execute the machine's outbound actions. Network failures are logged and
/// not retried; the transport owns reconnection.
async fn execute_actions<T: Transport>(
    transport: &T,
    timers: &mut DelayQueue<TimerId>,
    timer_keys: &mut HashMap<TimerId, Key>,
    actions: Vec<Action>,
    now: i64,
) {
    for action in actions {
        match action {
            Action::Broadcast { message } => match encode_envelope(message, now) {
                Ok(bytes) => {
                    let wire = TransportMessage::new(NODE_TOPIC, bytes);
                    if let Err(e) = transport.broadcast(wire).await {
                        warn!(error = %e, "Broadcast failed");
                    }
                }
                Err(e) => warn!(error = %e, "Broadcast encode failed"),
            },
            Action::Send { to, message } => match encode_envelope(message, now) {
                Ok(bytes) => {
                    let wire = TransportMessage::new(NODE_TOPIC, bytes);
                    if let Err(e) = transport.send(&to, wire).await {
                        warn!(%to, error = %e, "Send failed");
                    }
                }
                Err(e) => warn!(error = %e, "Send encode failed"),
            },
            Action::StartTimer { timer, after_ms } => {
                if let Some(key) = timer_keys.remove(&timer) {
                    timers.remove(&key);
                }
                let key = timers.insert(timer.clone(), Duration::from_millis(after_ms.max(0) as u64));
                timer_keys.insert(timer, key);
            }
            Action::CancelTimer { timer } => {
                if let Some(key) = timer_keys.remove(&timer) {
                    timers.remove(&key);
                }
            }
            Action::CommitReady { commit } => {
                // The node machine consumes commits internally; one leaking
                // here means a bare ordering machine was wired in.
                debug!(height = %commit.height, "Unconsumed commit action ignored");
            }
        }
    }
}

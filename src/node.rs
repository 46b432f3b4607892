//! Actor-based node driver — owns the engine in a dedicated task,
//! communicates via channels. No locks anywhere on the data path.
//!
//! Three concerns meet here: stdin commands arrive over the command channel,
//! the listener task forwards raw datagrams over the input channel, and the
//! actor sleeps until the earliest retransmission deadline in between. All
//! of them funnel into the one task that owns the engine; nothing else
//! touches window state.

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::input::packetize;
use crate::loss::LossGate;
use crate::transport::{Transport, UdpTransport};

use bytes::Bytes;
use sr_core::{unix_millis, Destination, Frame, SrEngine, SrStats};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Sleep used when no retransmission is pending; any command or datagram
/// wakes the actor long before it elapses.
const IDLE_SLEEP: Duration = Duration::from_secs(3600);

/// Commands sent to the node actor.
pub(crate) enum NodeCmd {
    Send {
        message: String,
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<SrStats>,
    },
    Close,
}

/// Clonable handle to the node actor.
#[derive(Clone)]
pub struct NodeHandle {
    cmd_tx: mpsc::Sender<NodeCmd>,
}

impl NodeHandle {
    /// Admit `message` to the send window, one data unit per character.
    ///
    /// Resolves once the admissions happened; it does not wait for
    /// acknowledgment. Never rejects for capacity — the overflow queue is
    /// unbounded.
    pub async fn send_message(&self, message: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(NodeCmd::Send {
                message: message.into(),
                reply,
            })
            .await
            .map_err(|_| NodeError::Closed)?;
        rx.await.map_err(|_| NodeError::Closed)
    }

    /// Snapshot of the engine counters.
    pub async fn stats(&self) -> Result<SrStats> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(NodeCmd::Stats { reply })
            .await
            .map_err(|_| NodeError::Closed)?;
        rx.await.map_err(|_| NodeError::Closed)
    }

    /// Stop the actor. Exists for tests; a real node runs until the process
    /// exits.
    pub fn close(&self) {
        let _ = self.cmd_tx.try_send(NodeCmd::Close);
    }
}

/// One Selective-Repeat node: a bound transport, a loss gate, and the engine
/// actor driving them.
pub struct SrNode {
    handle: NodeHandle,
    local_addr: SocketAddr,
    delivered_rx: mpsc::Receiver<Bytes>,
    trace_rx: mpsc::UnboundedReceiver<String>,
}

impl SrNode {
    /// Validate `config`, bind the local port, and start the listener and
    /// actor tasks.
    pub async fn bind(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        let transport = UdpTransport::bind(config.local_port).await?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Start a node over an already-bound transport. `config` must have been
    /// validated.
    pub fn with_transport<T: Transport>(transport: Arc<T>, config: NodeConfig) -> Result<Self> {
        let local_addr = transport.local_addr()?;
        let peer = SocketAddr::from(([127, 0, 0, 1], config.remote_port));

        let engine = SrEngine::new(config.engine_config());
        let gate = LossGate::new(config.loss);

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (input_tx, input_rx) = mpsc::channel(1024);
        let (delivered_tx, delivered_rx) = mpsc::channel(1024);
        let (trace_tx, trace_rx) = mpsc::unbounded_channel();

        // Listener task: forwards raw datagrams to the actor forever.
        // A receive failure is absorbed exactly like a lost datagram.
        let recv_transport = transport.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 65536];
            loop {
                match recv_transport.recv_from(&mut buf).await {
                    Ok((size, source)) => {
                        let datagram = Bytes::copy_from_slice(&buf[..size]);
                        if input_tx.send((datagram, source)).await.is_err() {
                            break; // actor gone
                        }
                    }
                    Err(e) => {
                        trace!(error = %e, "transport receive failed, ignoring");
                    }
                }
            }
        });

        tokio::spawn(run_node_actor(
            engine,
            gate,
            cmd_rx,
            input_rx,
            delivered_tx,
            trace_tx,
            transport,
            peer,
        ));

        Ok(Self {
            handle: NodeHandle { cmd_tx },
            local_addr,
            delivered_rx,
            trace_rx,
        })
    }

    /// Clonable handle to the actor.
    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    /// The bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// See [`NodeHandle::send_message`].
    pub async fn send_message(&self, message: impl Into<String>) -> Result<()> {
        self.handle.send_message(message).await
    }

    /// See [`NodeHandle::stats`].
    pub async fn stats(&self) -> Result<SrStats> {
        self.handle.stats().await
    }

    /// Next in-order delivered payload. `None` once the node is closed.
    pub async fn recv_delivered(&mut self) -> Option<Bytes> {
        self.delivered_rx.recv().await
    }

    /// Next rendered trace line. `None` once the node is closed.
    pub async fn next_trace(&mut self) -> Option<String> {
        self.trace_rx.recv().await
    }

    /// Split the node into its handle and output streams, for drivers that
    /// consume deliveries and trace lines from separate tasks.
    pub fn split(
        self,
    ) -> (
        NodeHandle,
        mpsc::Receiver<Bytes>,
        mpsc::UnboundedReceiver<String>,
    ) {
        (self.handle, self.delivered_rx, self.trace_rx)
    }
}

/// Run the node actor loop.
///
/// - `input_rx`: raw datagrams with their source address, from the listener.
/// - `delivered_tx`: in-order payloads forwarded to the application.
/// - `trace_tx`: rendered trace lines for stdout.
#[allow(clippy::too_many_arguments)]
async fn run_node_actor<T: Transport>(
    mut engine: SrEngine,
    mut gate: LossGate,
    mut cmd_rx: mpsc::Receiver<NodeCmd>,
    mut input_rx: mpsc::Receiver<(Bytes, SocketAddr)>,
    delivered_tx: mpsc::Sender<Bytes>,
    trace_tx: mpsc::UnboundedSender<String>,
    transport: Arc<T>,
    peer: SocketAddr,
) {
    loop {
        let until_deadline = match engine.next_deadline() {
            Some(deadline) => Duration::from_millis(deadline.saturating_sub(unix_millis())),
            None => IDLE_SLEEP,
        };

        tokio::select! {
            // Earliest retransmission deadline
            _ = tokio::time::sleep(until_deadline) => {
                engine.tick(unix_millis());
                flush(&mut engine, &transport, peer, None, &trace_tx, &delivered_tx).await;
            }

            // User commands
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(NodeCmd::Send { message, reply }) => {
                        let now = unix_millis();
                        for unit in packetize(&message) {
                            engine.admit(unit, now);
                        }
                        flush(&mut engine, &transport, peer, None, &trace_tx, &delivered_tx).await;
                        let _ = reply.send(());
                    }
                    Some(NodeCmd::Stats { reply }) => {
                        let _ = reply.send(*engine.stats());
                    }
                    Some(NodeCmd::Close) | None => break,
                }
            }

            // Inbound datagrams
            datagram = input_rx.recv() => {
                match datagram {
                    Some((raw, source)) => {
                        let frame = match Frame::decode(&raw) {
                            Ok(frame) => frame,
                            Err(e) => {
                                // Malformed datagram: absorbed like a lost one.
                                trace!(error = %e, "malformed datagram, ignoring");
                                continue;
                            }
                        };

                        if gate.decide(frame.kind()) {
                            continue;
                        }

                        engine.input_frame(frame, unix_millis());
                        flush(&mut engine, &transport, peer, Some(source), &trace_tx, &delivered_tx).await;
                    }
                    None => {
                        trace!("listener gone, stopping actor");
                        break;
                    }
                }
            }
        }
    }
}

/// Send queued datagrams, emit trace lines, and forward deliveries.
///
/// `source` is the origin of the datagram being processed, used to resolve
/// ACK destinations; sends are fire-and-forget.
async fn flush<T: Transport>(
    engine: &mut SrEngine,
    transport: &Arc<T>,
    peer: SocketAddr,
    source: Option<SocketAddr>,
    trace_tx: &mpsc::UnboundedSender<String>,
    delivered_tx: &mpsc::Sender<Bytes>,
) {
    for out in engine.drain_output() {
        let target = match out.to {
            Destination::Peer => peer,
            Destination::Source => source.unwrap_or(peer),
        };
        if let Err(e) = transport.send_to(&out.datagram, target).await {
            trace!(error = %e, "transport send failed, treated as loss");
        }
    }

    let now = unix_millis();
    for event in engine.drain_events() {
        if trace_tx.send(event.render(now)).is_err() {
            break;
        }
    }

    while let Some(payload) = engine.recv() {
        if delivered_tx.send(payload).await.is_err() {
            break;
        }
    }
}

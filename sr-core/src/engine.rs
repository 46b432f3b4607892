//! Selective-Repeat protocol engine
//!
//! Sans-io core: the engine never touches a socket or a clock. Callers feed
//! it admissions, decoded frames, and tick timestamps; it accumulates
//! outbound datagrams, trace events, and in-order deliveries in internal
//! queues that the caller drains after each operation. The engine expects a
//! single owner: multi-step transitions (ACK → slide → release, data →
//! slide → deliver) must not be interleaved with other operations.

use crate::config::SrConfig;
use crate::error::Result;
use crate::event::SrEvent;
use crate::frame::{Frame, SeqNum, Timestamp};
use crate::receiver::{ReceiverWindow, RecvOutcome};
use crate::sender::{AckOutcome, AdmitOutcome, SenderWindow};
use crate::timer::RetransmitQueue;

use bytes::Bytes;
use std::collections::VecDeque;
use tracing::trace;

/// Where an outbound datagram should be sent.
///
/// Data packets always go to the configured peer. Acknowledgments answer the
/// data packet that provoked them, so they are addressed to whatever endpoint
/// that datagram came from — the driver resolves [`Destination::Source`]
/// against the datagram it is currently processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The configured remote endpoint
    Peer,
    /// The source endpoint of the inbound datagram being processed
    Source,
}

/// One encoded datagram waiting to be sent, with its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: Destination,
    pub datagram: Bytes,
}

/// Counters for one engine's lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct SrStats {
    /// Data transmissions handed to the transport, retransmissions included
    pub packets_sent: u64,
    /// Timeout-driven retransmissions
    pub retransmissions: u64,
    /// Acknowledgments accepted by the sender window
    pub acks_received: u64,
    /// Duplicate or out-of-window acknowledgments dropped
    pub acks_ignored: u64,
    /// Data arrivals accepted into the receiver window
    pub data_received: u64,
    /// Duplicate or stale data arrivals discarded
    pub duplicates_discarded: u64,
    /// Data arrivals past the receiver window, dropped without an ACK
    pub out_of_window_dropped: u64,
    /// Payloads delivered to the application, in order
    pub delivered: u64,
    /// Acknowledgments handed to the transport
    pub acks_sent: u64,
}

/// The Selective-Repeat state machine for one node.
pub struct SrEngine {
    config: SrConfig,
    sender: SenderWindow,
    receiver: ReceiverWindow,
    timers: RetransmitQueue,

    output: VecDeque<Outbound>,
    events: VecDeque<SrEvent>,
    delivered: VecDeque<Bytes>,

    stats: SrStats,
}

impl SrEngine {
    /// Create a new engine. `config` is expected to be validated.
    pub fn new(config: SrConfig) -> Self {
        Self {
            sender: SenderWindow::new(config.window_size),
            receiver: ReceiverWindow::new(config.window_size),
            timers: RetransmitQueue::new(),
            output: VecDeque::new(),
            events: VecDeque::new(),
            delivered: VecDeque::new(),
            stats: SrStats::default(),
            config,
        }
    }

    /// Admit one application data unit for transmission.
    ///
    /// Assigns the next sequence number; transmits immediately when the
    /// window has room, queues otherwise. Never fails and never blocks —
    /// the overflow queue is unbounded.
    pub fn admit(&mut self, payload: Bytes, now: Timestamp) {
        match self.sender.admit(payload) {
            AdmitOutcome::Transmit(seq) => self.transmit(seq, now),
            AdmitOutcome::Queued(seq) => {
                trace!(seq, "admission queued until the window slides");
            }
        }
    }

    /// Decode and process one inbound datagram.
    ///
    /// Returns an error only for malformed datagrams; callers on the data
    /// path are expected to absorb it as they would a lost packet.
    pub fn input(&mut self, datagram: &[u8], now: Timestamp) -> Result<()> {
        let frame = Frame::decode(datagram)?;
        self.input_frame(frame, now);
        Ok(())
    }

    /// Process one already-decoded frame.
    pub fn input_frame(&mut self, frame: Frame, now: Timestamp) {
        match frame {
            Frame::Ack { seq } => self.on_ack(seq, now),
            Frame::Data { seq, payload } => self.on_data(seq, payload),
        }
    }

    /// Fire every retransmission deadline at or before `now`.
    ///
    /// A due entry whose packet has been acknowledged since it was scheduled
    /// is dropped silently — that is the only way a retransmission timer ever
    /// terminates. Unacknowledged packets are retransmitted and rescheduled
    /// one fixed interval out.
    pub fn tick(&mut self, now: Timestamp) {
        while let Some(seq) = self.timers.pop_due(now) {
            if self.sender.is_acked(seq) {
                trace!(seq, "timer fired for acknowledged packet, expiring");
                continue;
            }

            self.events.push_back(SrEvent::TimedOut { seq });
            self.stats.retransmissions += 1;
            self.transmit(seq, now);
        }
    }

    /// Earliest pending retransmission deadline, if any.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Take all datagrams queued for transmission.
    pub fn drain_output(&mut self) -> Vec<Outbound> {
        self.output.drain(..).collect()
    }

    /// Take all trace events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SrEvent> {
        self.events.drain(..).collect()
    }

    /// Next in-order delivered payload, if any.
    pub fn recv(&mut self) -> Option<Bytes> {
        self.delivered.pop_front()
    }

    /// Current statistics
    pub fn stats(&self) -> &SrStats {
        &self.stats
    }

    /// Current sender window bounds `(base, base + window)`
    pub fn send_window(&self) -> (SeqNum, SeqNum) {
        self.sender.bounds()
    }

    /// Current receiver window bounds `(base, base + window)`
    pub fn recv_window(&self) -> (SeqNum, SeqNum) {
        self.receiver.bounds()
    }

    /// Number of scheduled retransmission entries, dead ones included.
    pub fn scheduled_timers(&self) -> usize {
        self.timers.len()
    }

    fn on_ack(&mut self, seq: SeqNum, now: Timestamp) {
        match self.sender.on_ack(seq) {
            AckOutcome::Ignored => {
                self.stats.acks_ignored += 1;
            }
            AckOutcome::Acked { seq } => {
                self.stats.acks_received += 1;
                self.events.push_back(SrEvent::AckReceived { seq, window: None });
            }
            AckOutcome::Advanced {
                seq,
                window,
                released,
            } => {
                self.stats.acks_received += 1;
                self.events.push_back(SrEvent::AckReceived {
                    seq,
                    window: Some(window),
                });
                // Queue order is sequence order; each released packet gets a
                // fresh transmission and timer.
                for (seq, _) in released {
                    self.transmit(seq, now);
                }
            }
        }
    }

    fn on_data(&mut self, seq: SeqNum, payload: Bytes) {
        match self.receiver.on_data(seq, payload.clone()) {
            RecvOutcome::OutOfWindow => {
                self.stats.out_of_window_dropped += 1;
            }
            RecvOutcome::Duplicate => {
                self.stats.duplicates_discarded += 1;
                self.events.push_back(SrEvent::Discarded { seq, payload });
                self.send_ack(seq);
            }
            RecvOutcome::Buffered => {
                self.stats.data_received += 1;
                self.events.push_back(SrEvent::Received {
                    seq,
                    payload,
                    window: None,
                });
                self.send_ack(seq);
            }
            RecvOutcome::Delivered { payloads, window } => {
                self.stats.data_received += 1;
                self.stats.delivered += payloads.len() as u64;
                self.events.push_back(SrEvent::Received {
                    seq,
                    payload,
                    window: Some(window),
                });
                self.delivered.extend(payloads);
                self.send_ack(seq);
            }
        }
    }

    /// Transmit (or retransmit) an in-flight packet and arm its next
    /// retransmission deadline.
    fn transmit(&mut self, seq: SeqNum, now: Timestamp) {
        let Some(payload) = self.sender.in_flight_payload(seq).cloned() else {
            // Unreachable: every caller holds an in-flight seq.
            return;
        };

        self.output.push_back(Outbound {
            to: Destination::Peer,
            datagram: Frame::data(seq, payload.clone()).encode(),
        });
        self.events.push_back(SrEvent::Sent { seq, payload });
        self.timers
            .schedule(seq, now + self.config.retransmit_timeout_ms);
        self.stats.packets_sent += 1;
    }

    /// ACK back to the source of the datagram being processed. Every
    /// in-range data arrival is ACKed, duplicates included.
    fn send_ack(&mut self, seq: SeqNum) {
        self.output.push_back(Outbound {
            to: Destination::Source,
            datagram: Frame::ack(seq).encode(),
        });
        self.events.push_back(SrEvent::AckSent { seq });
        self.stats.acks_sent += 1;
    }
}

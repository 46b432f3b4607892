//! Send-side sliding window
//!
//! Owns the sequence counter, the window base, the acknowledged set, and the
//! overflow queue for admissions that arrive while the window is full. All
//! mutation goes through [`SenderWindow::admit`] and [`SenderWindow::on_ack`];
//! the engine turns the returned outcomes into transmissions and trace
//! events.

use crate::frame::SeqNum;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{trace, warn};

/// Result of admitting one data unit.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AdmitOutcome {
    /// The packet fits in the window and should be transmitted now
    Transmit(SeqNum),
    /// The window is full; the packet was queued for a later slide
    Queued(SeqNum),
}

/// Result of applying one acknowledgment.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AckOutcome {
    /// Duplicate or out-of-window ACK; no state changed
    Ignored,
    /// ACK accepted, but the window base did not move
    Acked { seq: SeqNum },
    /// ACK accepted for the base packet; the window slid forward
    Advanced {
        seq: SeqNum,
        /// New window bounds `(base, base + window)`
        window: (SeqNum, SeqNum),
        /// Queued packets released by the slide, in sequence order
        released: Vec<(SeqNum, Bytes)>,
    },
}

/// Send-side state of the Selective-Repeat protocol.
#[derive(Debug)]
pub(crate) struct SenderWindow {
    /// Lowest sequence number not yet fully acknowledged
    base: SeqNum,
    /// Next sequence number to assign
    next_seq: SeqNum,
    /// Window size, fixed at construction
    window: u64,
    /// Acknowledged sequence numbers; always a subset of `[base, base+window)`
    acked: BTreeSet<SeqNum>,
    /// Transmitted, unacknowledged payloads, kept for retransmission
    in_flight: BTreeMap<SeqNum, Bytes>,
    /// Admissions that did not fit in the window, in sequence order.
    /// Unbounded; admission never fails.
    pending: VecDeque<(SeqNum, Bytes)>,
}

impl SenderWindow {
    pub(crate) fn new(window: u64) -> Self {
        Self {
            base: 0,
            next_seq: 0,
            window,
            acked: BTreeSet::new(),
            in_flight: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Current window bounds `(base, base + window)`.
    pub(crate) fn bounds(&self) -> (SeqNum, SeqNum) {
        (self.base, self.base + self.window)
    }

    /// Assign the next sequence number to `payload` and decide whether it can
    /// be transmitted immediately. Never fails.
    pub(crate) fn admit(&mut self, payload: Bytes) -> AdmitOutcome {
        let seq = self.next_seq;
        self.next_seq += 1;

        if seq < self.base + self.window {
            self.in_flight.insert(seq, payload);
            AdmitOutcome::Transmit(seq)
        } else {
            trace!(seq, "window full, queueing admission");
            self.pending.push_back((seq, payload));
            AdmitOutcome::Queued(seq)
        }
    }

    /// Apply one acknowledgment.
    ///
    /// Out-of-window ACKs would violate the protocol invariant under matched
    /// window sizes; they are dropped without touching any state.
    pub(crate) fn on_ack(&mut self, seq: SeqNum) -> AckOutcome {
        if seq < self.base || seq >= self.base + self.window {
            warn!(seq, base = self.base, "ACK outside window, dropping");
            return AckOutcome::Ignored;
        }
        if self.acked.contains(&seq) {
            trace!(seq, "duplicate ACK, dropping");
            return AckOutcome::Ignored;
        }

        self.acked.insert(seq);
        self.in_flight.remove(&seq);

        if seq != self.base {
            return AckOutcome::Acked { seq };
        }

        // Slide the base past every contiguously acknowledged packet,
        // pruning the acknowledged set so it stays inside the window.
        while self.acked.remove(&self.base) {
            self.base += 1;
        }

        // Release queued packets that now fit in the window, in order.
        let mut released = Vec::new();
        while let Some((next, _)) = self.pending.front() {
            if *next >= self.base + self.window {
                break;
            }
            let (next, payload) = self.pending.pop_front().expect("front checked");
            self.in_flight.insert(next, payload.clone());
            released.push((next, payload));
        }

        AckOutcome::Advanced {
            seq,
            window: self.bounds(),
            released,
        }
    }

    /// Whether `seq` has been acknowledged. Sequence numbers the base has
    /// already slid past were acknowledged by construction.
    pub(crate) fn is_acked(&self, seq: SeqNum) -> bool {
        seq < self.base || self.acked.contains(&seq)
    }

    /// Payload of a transmitted, unacknowledged packet (for retransmission).
    pub(crate) fn in_flight_payload(&self, seq: SeqNum) -> Option<&Bytes> {
        self.in_flight.get(&seq)
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let (start, end) = self.bounds();
        assert!(self.acked.iter().all(|s| (start..end).contains(s)));
        assert!(self.next_seq >= self.base);
        assert!(self.in_flight.keys().all(|s| (start..end).contains(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(b: u8) -> Bytes {
        Bytes::copy_from_slice(&[b])
    }

    fn filled_window(window: u64, admissions: u64) -> SenderWindow {
        let mut sender = SenderWindow::new(window);
        for i in 0..admissions {
            sender.admit(unit(b'a' + i as u8));
        }
        sender
    }

    #[test]
    fn admissions_beyond_window_queue() {
        let mut sender = SenderWindow::new(4);
        for i in 0..4 {
            assert_eq!(sender.admit(unit(b'a')), AdmitOutcome::Transmit(i));
        }
        assert_eq!(sender.admit(unit(b'e')), AdmitOutcome::Queued(4));
        assert_eq!(sender.admit(unit(b'f')), AdmitOutcome::Queued(5));
        sender.assert_invariants();
    }

    #[test]
    fn base_ack_advances_and_releases_queue() {
        let mut sender = filled_window(4, 6);

        match sender.on_ack(0) {
            AckOutcome::Advanced {
                seq,
                window,
                released,
            } => {
                assert_eq!(seq, 0);
                assert_eq!(window, (1, 5));
                assert_eq!(released.len(), 1);
                assert_eq!(released[0].0, 4);
            }
            other => panic!("expected advance, got {other:?}"),
        }
        sender.assert_invariants();
    }

    #[test]
    fn non_base_ack_does_not_advance() {
        let mut sender = filled_window(4, 4);
        assert_eq!(sender.on_ack(2), AckOutcome::Acked { seq: 2 });
        assert_eq!(sender.bounds(), (0, 4));
        sender.assert_invariants();
    }

    #[test]
    fn base_ack_skips_over_earlier_acks() {
        let mut sender = filled_window(4, 4);
        sender.on_ack(1);
        sender.on_ack(2);

        // Acking the base should advance past 1 and 2 in one slide.
        match sender.on_ack(0) {
            AckOutcome::Advanced { window, .. } => assert_eq!(window, (3, 7)),
            other => panic!("expected advance, got {other:?}"),
        }
        sender.assert_invariants();
    }

    #[test]
    fn duplicate_ack_is_idempotent() {
        let mut sender = filled_window(4, 4);
        assert_eq!(sender.on_ack(2), AckOutcome::Acked { seq: 2 });
        assert_eq!(sender.on_ack(2), AckOutcome::Ignored);
        assert!(sender.is_acked(2));
        sender.assert_invariants();
    }

    #[test]
    fn out_of_window_ack_ignored() {
        let mut sender = filled_window(4, 4);
        assert_eq!(sender.on_ack(5), AckOutcome::Ignored);
        assert_eq!(sender.on_ack(17), AckOutcome::Ignored);
        assert_eq!(sender.bounds(), (0, 4));
        assert!(!sender.is_acked(5));
        sender.assert_invariants();
    }

    #[test]
    fn acked_below_base_after_slide() {
        let mut sender = filled_window(4, 4);
        sender.on_ack(0);
        assert!(sender.is_acked(0));
        assert!(sender.in_flight_payload(0).is_none());
    }

    #[test]
    fn release_respects_queue_order() {
        let mut sender = filled_window(2, 6);
        sender.on_ack(1);

        match sender.on_ack(0) {
            AckOutcome::Advanced {
                window, released, ..
            } => {
                assert_eq!(window, (2, 4));
                let seqs: Vec<SeqNum> = released.iter().map(|(s, _)| *s).collect();
                assert_eq!(seqs, vec![2, 3]);
            }
            other => panic!("expected advance, got {other:?}"),
        }
        sender.assert_invariants();
    }
}

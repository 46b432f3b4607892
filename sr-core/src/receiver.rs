//! Receive-side sliding window
//!
//! Owns the delivery base and the out-of-order buffer. Acknowledgment policy
//! lives in the engine: every outcome except [`RecvOutcome::OutOfWindow`]
//! must be answered with an ACK to the packet's source, whether the payload
//! was stored or discarded.

use crate::frame::SeqNum;
use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Result of applying one data arrival.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RecvOutcome {
    /// Sequence number at or past `base + window`; dropped without an ACK.
    /// Unreachable when both ends run the same window size.
    OutOfWindow,
    /// Stale (below base) or already buffered; discarded but still ACKed
    Duplicate,
    /// Stored out of order; the base did not move
    Buffered,
    /// Arrival at the base; the window slid and delivered contiguous payloads
    Delivered {
        /// Payloads released in strictly increasing sequence order
        payloads: Vec<Bytes>,
        /// New window bounds `(base, base + window)`
        window: (SeqNum, SeqNum),
    },
}

/// Receive-side state of the Selective-Repeat protocol.
#[derive(Debug)]
pub(crate) struct ReceiverWindow {
    /// Lowest sequence number not yet delivered
    base: SeqNum,
    /// Window size, fixed at construction
    window: u64,
    /// Received-but-undelivered packets; keys always in `[base, base+window)`
    buffer: BTreeMap<SeqNum, Bytes>,
}

impl ReceiverWindow {
    pub(crate) fn new(window: u64) -> Self {
        Self {
            base: 0,
            window,
            buffer: BTreeMap::new(),
        }
    }

    /// Current window bounds `(base, base + window)`.
    pub(crate) fn bounds(&self) -> (SeqNum, SeqNum) {
        (self.base, self.base + self.window)
    }

    /// Apply one data arrival.
    pub(crate) fn on_data(&mut self, seq: SeqNum, payload: Bytes) -> RecvOutcome {
        if seq >= self.base + self.window {
            warn!(seq, base = self.base, "data outside window, dropping");
            return RecvOutcome::OutOfWindow;
        }

        if seq < self.base || self.buffer.contains_key(&seq) {
            trace!(seq, base = self.base, "duplicate or stale data");
            return RecvOutcome::Duplicate;
        }

        self.buffer.insert(seq, payload);

        if seq != self.base {
            return RecvOutcome::Buffered;
        }

        // Deliver the contiguous run starting at the base, sliding as we go.
        let mut payloads = Vec::new();
        while let Some(payload) = self.buffer.remove(&self.base) {
            payloads.push(payload);
            self.base += 1;
        }

        RecvOutcome::Delivered {
            payloads,
            window: self.bounds(),
        }
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let (start, end) = self.bounds();
        assert!(self.buffer.keys().all(|s| (start..end).contains(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(b: u8) -> Bytes {
        Bytes::copy_from_slice(&[b])
    }

    #[test]
    fn in_order_arrival_delivers_immediately() {
        let mut receiver = ReceiverWindow::new(4);
        match receiver.on_data(0, unit(b'a')) {
            RecvOutcome::Delivered { payloads, window } => {
                assert_eq!(payloads, vec![unit(b'a')]);
                assert_eq!(window, (1, 5));
            }
            other => panic!("expected delivery, got {other:?}"),
        }
        receiver.assert_invariants();
    }

    #[test]
    fn out_of_order_arrival_buffers() {
        let mut receiver = ReceiverWindow::new(4);
        assert_eq!(receiver.on_data(2, unit(b'c')), RecvOutcome::Buffered);
        assert_eq!(receiver.bounds(), (0, 4));
        receiver.assert_invariants();
    }

    #[test]
    fn base_arrival_flushes_buffered_run() {
        let mut receiver = ReceiverWindow::new(4);
        receiver.on_data(2, unit(b'c'));
        receiver.on_data(1, unit(b'b'));

        match receiver.on_data(0, unit(b'a')) {
            RecvOutcome::Delivered { payloads, window } => {
                assert_eq!(payloads, vec![unit(b'a'), unit(b'b'), unit(b'c')]);
                assert_eq!(window, (3, 7));
            }
            other => panic!("expected delivery, got {other:?}"),
        }
        receiver.assert_invariants();
    }

    #[test]
    fn duplicate_of_buffered_packet_discarded() {
        let mut receiver = ReceiverWindow::new(4);
        receiver.on_data(2, unit(b'c'));
        assert_eq!(receiver.on_data(2, unit(b'c')), RecvOutcome::Duplicate);
        receiver.assert_invariants();
    }

    #[test]
    fn stale_arrival_discarded() {
        let mut receiver = ReceiverWindow::new(4);
        receiver.on_data(0, unit(b'a'));
        assert_eq!(receiver.on_data(0, unit(b'a')), RecvOutcome::Duplicate);
        assert_eq!(receiver.bounds(), (1, 5));
        receiver.assert_invariants();
    }

    #[test]
    fn duplicate_application_is_idempotent() {
        let mut receiver = ReceiverWindow::new(4);
        receiver.on_data(1, unit(b'b'));
        let bounds = receiver.bounds();
        receiver.on_data(1, unit(b'b'));
        assert_eq!(receiver.bounds(), bounds);
        receiver.assert_invariants();
    }

    #[test]
    fn arrival_past_window_dropped() {
        let mut receiver = ReceiverWindow::new(4);
        assert_eq!(receiver.on_data(4, unit(b'e')), RecvOutcome::OutOfWindow);
        assert_eq!(receiver.bounds(), (0, 4));
        receiver.assert_invariants();
    }
}

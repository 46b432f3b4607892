//! Trace events emitted by the engine
//!
//! The rendered line formats are an external contract — downstream tooling
//! parses them — so [`SrEvent::render`] is covered by exact-match tests and
//! must not be reworded.

use crate::frame::{SeqNum, Timestamp};
use bytes::Bytes;

/// One observable protocol event.
///
/// The `window` field on [`SrEvent::AckReceived`] and [`SrEvent::Received`]
/// distinguishes a window-advancing arrival (`Some((start, end))`, with the
/// new bounds) from one that left the base untouched (`None`). The
/// distinction is externally observable and preserved all the way to the
/// trace output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrEvent {
    /// A data packet was handed to the transport (first send or retransmit)
    Sent { seq: SeqNum, payload: Bytes },
    /// An acknowledgment was accepted by the sender window
    AckReceived {
        seq: SeqNum,
        window: Option<(SeqNum, SeqNum)>,
    },
    /// A retransmission timer fired for a still-unacknowledged packet
    TimedOut { seq: SeqNum },
    /// A data packet was accepted into the receiver window
    Received {
        seq: SeqNum,
        payload: Bytes,
        window: Option<(SeqNum, SeqNum)>,
    },
    /// An acknowledgment was handed to the transport
    AckSent { seq: SeqNum },
    /// A duplicate or stale data packet was discarded (still acknowledged)
    Discarded { seq: SeqNum, payload: Bytes },
}

impl SrEvent {
    /// Render this event as one trace line, stamped with `ts` (milliseconds
    /// since the Unix epoch).
    pub fn render(&self, ts: Timestamp) -> String {
        match self {
            SrEvent::Sent { seq, payload } => {
                format!("{ts} packet-{seq} {} sent", text(payload))
            }
            SrEvent::AckReceived { seq, window: None } => {
                format!("{ts} ACK-{seq} received")
            }
            SrEvent::AckReceived {
                seq,
                window: Some((start, end)),
            } => {
                format!("{ts} ACK-{seq} received; window = [{start},{end}]")
            }
            SrEvent::TimedOut { seq } => {
                format!("{ts} packet-{seq} timeout")
            }
            SrEvent::Received {
                seq,
                payload,
                window: None,
            } => {
                format!("{ts} packet-{seq} {} received", text(payload))
            }
            SrEvent::Received {
                seq,
                payload,
                window: Some((start, end)),
            } => {
                format!(
                    "{ts} packet-{seq} {} received; window = [{start},{end}]",
                    text(payload)
                )
            }
            SrEvent::AckSent { seq } => {
                format!("{ts} ACK-{seq} sent")
            }
            SrEvent::Discarded { seq, payload } => {
                format!("{ts} packet-{seq} {} discarded", text(payload))
            }
        }
    }
}

fn text(payload: &Bytes) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn sent_line() {
        let event = SrEvent::Sent {
            seq: 3,
            payload: payload("h"),
        };
        assert_eq!(event.render(1700000000000), "1700000000000 packet-3 h sent");
    }

    #[test]
    fn ack_lines() {
        let plain = SrEvent::AckReceived {
            seq: 2,
            window: None,
        };
        assert_eq!(plain.render(5), "5 ACK-2 received");

        let advance = SrEvent::AckReceived {
            seq: 0,
            window: Some((1, 5)),
        };
        assert_eq!(advance.render(5), "5 ACK-0 received; window = [1,5]");
    }

    #[test]
    fn timeout_line() {
        let event = SrEvent::TimedOut { seq: 9 };
        assert_eq!(event.render(7), "7 packet-9 timeout");
    }

    #[test]
    fn receive_lines() {
        let plain = SrEvent::Received {
            seq: 2,
            payload: payload("c"),
            window: None,
        };
        assert_eq!(plain.render(1), "1 packet-2 c received");

        let advance = SrEvent::Received {
            seq: 1,
            payload: payload("b"),
            window: Some((3, 7)),
        };
        assert_eq!(advance.render(1), "1 packet-1 b received; window = [3,7]");
    }

    #[test]
    fn ack_sent_and_discard_lines() {
        assert_eq!(SrEvent::AckSent { seq: 4 }.render(2), "2 ACK-4 sent");

        let discard = SrEvent::Discarded {
            seq: 0,
            payload: payload("a"),
        };
        assert_eq!(discard.render(2), "2 packet-0 a discarded");
    }
}

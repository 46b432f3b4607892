//! Wire framing for the Selective-Repeat protocol
//!
//! Datagram payloads are ASCII text in one of two forms:
//!
//! - data:    `<seq>_<payload>` — `seq` is a base-10 non-negative integer,
//!   everything after the first `_` is the payload, verbatim
//! - control: `ACK,<seq>`
//!
//! A datagram is decoded exactly once, at the node boundary, into a [`Frame`];
//! everything past that point works with the tagged variant rather than
//! re-inspecting prefixes.

use crate::error::{Result, SrError};
use bytes::{BufMut, Bytes, BytesMut};

/// Sequence number type.
///
/// Assigned once, strictly increasing per direction; never wraps.
pub type SeqNum = u64;

/// Timestamp type (milliseconds)
pub type Timestamp = u64;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// The engine itself never reads the clock; drivers stamp operations and
/// trace lines with this.
pub fn unix_millis() -> Timestamp {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Timestamp
}

const ACK_PREFIX: &[u8] = b"ACK,";

/// Structural classification of a frame, used by the loss gate's
/// direction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Application data carrying a sequence number and payload
    Data,
    /// Control acknowledgment for a single sequence number
    Ack,
}

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Data frame: one application data unit
    Data { seq: SeqNum, payload: Bytes },
    /// Acknowledgment for exactly one sequence number (not cumulative)
    Ack { seq: SeqNum },
}

impl Frame {
    /// Create a data frame
    pub fn data(seq: SeqNum, payload: impl Into<Bytes>) -> Self {
        Frame::Data {
            seq,
            payload: payload.into(),
        }
    }

    /// Create an acknowledgment frame
    pub fn ack(seq: SeqNum) -> Self {
        Frame::Ack { seq }
    }

    /// The sequence number this frame refers to
    pub fn seq(&self) -> SeqNum {
        match self {
            Frame::Data { seq, .. } | Frame::Ack { seq } => *seq,
        }
    }

    /// Structural kind of this frame
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Data { .. } => FrameKind::Data,
            Frame::Ack { .. } => FrameKind::Ack,
        }
    }

    /// Encode this frame into its wire form
    pub fn encode(&self) -> Bytes {
        match self {
            Frame::Data { seq, payload } => {
                let mut buf = BytesMut::with_capacity(21 + payload.len());
                buf.put_slice(seq.to_string().as_bytes());
                buf.put_u8(b'_');
                buf.put_slice(payload);
                buf.freeze()
            }
            Frame::Ack { seq } => {
                let mut buf = BytesMut::with_capacity(ACK_PREFIX.len() + 20);
                buf.put_slice(ACK_PREFIX);
                buf.put_slice(seq.to_string().as_bytes());
                buf.freeze()
            }
        }
    }

    /// Decode a wire datagram into a frame.
    ///
    /// Control frames are recognized by the `ACK,` prefix; no data frame can
    /// collide with it because a data frame always starts with a digit.
    pub fn decode(raw: &[u8]) -> Result<Frame> {
        if let Some(digits) = raw.strip_prefix(ACK_PREFIX) {
            let seq = parse_seq(digits)?;
            return Ok(Frame::Ack { seq });
        }

        let separator = raw
            .iter()
            .position(|&b| b == b'_')
            .ok_or_else(|| SrError::frame("datagram is neither ACK nor data"))?;
        let seq = parse_seq(&raw[..separator])?;

        Ok(Frame::Data {
            seq,
            payload: Bytes::copy_from_slice(&raw[separator + 1..]),
        })
    }
}

/// Parse a base-10 sequence number; rejects empty input, signs, and
/// non-digit bytes.
fn parse_seq(digits: &[u8]) -> Result<SeqNum> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(SrError::frame("invalid sequence number"));
    }

    std::str::from_utf8(digits)
        .expect("ascii digits are valid utf-8")
        .parse::<SeqNum>()
        .map_err(|_| SrError::frame("sequence number out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_frame_round_trip() {
        let frame = Frame::data(42, Bytes::from_static(b"x"));
        let encoded = frame.encode();
        assert_eq!(&encoded[..], b"42_x");
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn ack_frame_round_trip() {
        let frame = Frame::ack(7);
        let encoded = frame.encode();
        assert_eq!(&encoded[..], b"ACK,7");
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn payload_keeps_underscores_verbatim() {
        let decoded = Frame::decode(b"3_a_b_c").unwrap();
        assert_eq!(decoded, Frame::data(3, Bytes::from_static(b"a_b_c")));
    }

    #[test]
    fn empty_payload_is_valid() {
        let decoded = Frame::decode(b"0_").unwrap();
        assert_eq!(decoded, Frame::data(0, Bytes::new()));
    }

    #[test]
    fn payload_may_contain_ack_text() {
        // "ACK," only classifies a frame when it is the datagram prefix
        let decoded = Frame::decode(b"5_ACK,3").unwrap();
        assert_eq!(decoded, Frame::data(5, Bytes::from_static(b"ACK,3")));
    }

    #[test]
    fn malformed_datagrams_rejected() {
        for raw in [
            &b"hello"[..],
            b"_payload",
            b"-1_x",
            b"12a_x",
            b"ACK,",
            b"ACK,abc",
            b"ACK,-4",
            b"",
        ] {
            assert!(Frame::decode(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn kind_and_seq_classification() {
        assert_eq!(Frame::ack(1).kind(), FrameKind::Ack);
        assert_eq!(Frame::data(1, Bytes::new()).kind(), FrameKind::Data);
        assert_eq!(Frame::ack(9).seq(), 9);
        assert_eq!(Frame::data(4, Bytes::new()).seq(), 4);
    }
}

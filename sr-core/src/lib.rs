//! Pure synchronous Selective-Repeat ARQ engine.
//!
//! This crate implements the Selective-Repeat protocol core with zero runtime
//! dependencies — no tokio, no async, no I/O, no clock reads. It only depends
//! on `bytes`, `thiserror`, and `tracing`.
//!
//! ```text
//! ┌────────────────────────────────┐
//! │  sr-core                       │
//! │                                │
//! │  frame     ← wire forms        │
//! │  config    ← tuning            │
//! │  error     ← 2 variants        │
//! │  event     ← trace contract    │
//! │  sender    ← send window       │
//! │  receiver  ← receive window    │
//! │  timer     ← retransmit queue  │
//! │  engine    ← state machine     │
//! └────────────────────────────────┘
//! ```
//!
//! Every operation takes an explicit millisecond timestamp, so tests drive
//! the engine with a hand-advanced clock and retransmission behavior is
//! fully deterministic.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod frame;

mod receiver;
mod sender;
mod timer;

pub use config::SrConfig;
pub use engine::{Destination, Outbound, SrEngine, SrStats};
pub use error::{Result, SrError};
pub use event::SrEvent;
pub use frame::{unix_millis, Frame, FrameKind, SeqNum, Timestamp};

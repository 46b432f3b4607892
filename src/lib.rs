//! Selective-Repeat ARQ node over UDP.
//!
//! A teaching/research transport that layers reliable, ordered, point-to-point
//! delivery on an unreliable datagram substrate, with configurable synthetic
//! loss on the inbound path for studying ARQ behavior.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CLI / stdin       │  send <message>
//! ├─────────────────────┤
//! │   Node actor        │  owns the engine, resolves destinations,
//! │                     │  sleeps until the next retransmit deadline
//! ├─────────────────────┤
//! │   Protocol core     │  sr-core: windows, timers, framing, events
//! ├─────────────────────┤
//! │   Loss gate         │  seeded per-datagram drop decisions (inbound)
//! ├─────────────────────┤
//! │   Transport         │  unreliable UDP send/receive
//! └─────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`config`]    — node configuration and validation
//! - [`error`]     — error taxonomy (only configuration errors are fatal)
//! - [`input`]     — the `send <message>` command surface and packetization
//! - [`loss`]      — synthetic inbound packet loss
//! - [`node`]      — the engine-owning actor and its handle
//! - [`transport`] — unreliable datagram transport abstraction

pub mod config;
pub mod error;
pub mod input;
pub mod loss;
pub mod node;
pub mod transport;

pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use input::{packetize, parse_command, Command};
pub use loss::{LossConfig, LossGate, LossMode};
pub use node::{NodeHandle, SrNode};
pub use transport::{Transport, UdpTransport};

// Re-export the protocol core under one roof.
pub use sr_core::{SrConfig, SrEngine, SrEvent, SrStats};

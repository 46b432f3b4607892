//! Configuration for the Selective-Repeat protocol engine

use crate::error::{Result, SrError};

/// Protocol-only configuration for the engine.
///
/// Contains only the fields the engine reads — no transport or I/O settings.
/// Both ends of a link are expected to run the same `window_size`; the
/// out-of-window handling in the engine assumes it.
#[derive(Debug, Clone)]
pub struct SrConfig {
    /// Sliding window size, in packets, for both sender and receiver
    pub window_size: u64,
    /// Fixed delay between retransmissions of an unacknowledged packet,
    /// in milliseconds
    pub retransmit_timeout_ms: u64,
}

impl Default for SrConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            retransmit_timeout_ms: 300,
        }
    }
}

impl SrConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sliding window size
    pub fn window_size(mut self, window: u64) -> Self {
        self.window_size = window;
        self
    }

    /// Set the retransmission timeout in milliseconds
    pub fn retransmit_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.retransmit_timeout_ms = timeout_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SrError::config("window size must be greater than 0"));
        }

        if self.retransmit_timeout_ms == 0 {
            return Err(SrError::config(
                "retransmission timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

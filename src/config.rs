//! Node configuration
//!
//! Validation happens once, before any socket is bound; a bad configuration
//! is the only error that may terminate the process.

use crate::error::{NodeError, Result};
use crate::loss::LossConfig;
use sr_core::SrConfig;

/// Complete configuration for one node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Local UDP port to bind
    pub local_port: u16,
    /// Peer UDP port on the loopback interface
    pub remote_port: u16,
    /// Sliding window size, in packets
    pub window_size: u64,
    /// Fixed retransmission timeout in milliseconds
    pub retransmit_timeout_ms: u64,
    /// Inbound loss simulation
    pub loss: LossConfig,
}

impl NodeConfig {
    /// Create a configuration for a `local_port` ↔ `remote_port` pair with
    /// default window, timeout, and no loss.
    pub fn new(local_port: u16, remote_port: u16) -> Self {
        let defaults = SrConfig::default();
        Self {
            local_port,
            remote_port,
            window_size: defaults.window_size,
            retransmit_timeout_ms: defaults.retransmit_timeout_ms,
            loss: LossConfig::default(),
        }
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

    /// Set the inbound loss simulation
    pub fn loss(mut self, loss: LossConfig) -> Self {
        self.loss = loss;
        self
    }

    /// The engine-facing subset of this configuration.
    pub fn engine_config(&self) -> SrConfig {
        SrConfig::new()
            .window_size(self.window_size)
            .retransmit_timeout_ms(self.retransmit_timeout_ms)
    }

    /// Validate everything the process needs before it touches the network.
    pub fn validate(&self) -> Result<()> {
        if self.local_port == 0 {
            return Err(NodeError::config("local port must be greater than 0"));
        }

        if self.remote_port == 0 {
            return Err(NodeError::config("remote port must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.loss.probability) {
            return Err(NodeError::config(
                "loss probability must be between 0.0 and 1.0",
            ));
        }

        self.engine_config().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pair_is_valid() {
        assert!(NodeConfig::new(4000, 4001).validate().is_ok());
    }

    #[test]
    fn zero_ports_rejected() {
        assert!(NodeConfig::new(0, 4001).validate().is_err());
        assert!(NodeConfig::new(4000, 0).validate().is_err());
    }

    #[test]
    fn loss_probability_range_checked() {
        let mut config = NodeConfig::new(4000, 4001);
        config.loss.probability = 1.5;
        assert!(config.validate().is_err());

        config.loss.probability = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn engine_fields_validated_too() {
        let config = NodeConfig::new(4000, 4001).window_size(0);
        assert!(config.validate().is_err());

        let config = NodeConfig::new(4000, 4001).retransmit_timeout_ms(0);
        assert!(config.validate().is_err());
    }
}

//! Error types for the node runtime

use thiserror::Error;

/// Result type for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors surfaced by the node runtime.
///
/// Only configuration errors are fatal; everything on the data path is
/// absorbed at the boundary and recovered by retransmission.
#[derive(Error, Debug)]
pub enum NodeError {
    /// I/O related errors (socket bind, local address lookup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid startup configuration
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The engine actor is gone; the node is shut down
    #[error("node closed")]
    Closed,
}

impl NodeError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        NodeError::Config {
            message: message.into(),
        }
    }
}

impl From<sr_core::SrError> for NodeError {
    fn from(err: sr_core::SrError) -> Self {
        NodeError::config(err.to_string())
    }
}

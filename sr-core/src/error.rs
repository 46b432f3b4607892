//! Error types for the Selective-Repeat protocol engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SrError>;

/// Error types produced by the protocol engine.
///
/// Intentionally minimal — only the variants the engine actually produces.
/// Data-path problems (malformed datagrams) surface as [`SrError::Frame`] and
/// are expected to be absorbed at the I/O boundary; nothing here is fatal to
/// a running node.
#[derive(Error, Debug)]
pub enum SrError {
    /// Invalid configuration (zero window, zero timeout)
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Malformed wire datagram
    #[error("frame error: {message}")]
    Frame { message: String },
}

impl SrError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        SrError::Config {
            message: message.into(),
        }
    }

    /// Create a frame error
    pub fn frame(message: impl Into<String>) -> Self {
        SrError::Frame {
            message: message.into(),
        }
    }
}

//! Error types for tagframe
//!
//! Provides a unified error type for all operations. Tag lookups that miss
//! are not errors; they come back as `None`.

use thiserror::Error;

/// Result type alias using TagFrameError
pub type Result<T> = std::result::Result<T, TagFrameError>;

/// Unified error type for tagframe operations
#[derive(Debug, Error)]
pub enum TagFrameError {
    // -------------------------------------------------------------------------
    // Storage I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote server answered with an error status
    #[error("Remote storage error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Range / Framing Errors
    // -------------------------------------------------------------------------
    #[error("Range {start}..{end} is out of bounds for storage of size {size}")]
    OutOfRange { start: u64, end: u64, size: u64 },

    #[error("Malformed indicator at offset {position}: {reason}")]
    MalformedIndicator { position: u64, reason: String },

    #[error("Invalid UTF-8 text: {0}")]
    InvalidUtf8(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TagFrameError {
    /// Build a `MalformedIndicator` error
    pub(crate) fn malformed(position: u64, reason: impl Into<String>) -> Self {
        TagFrameError::MalformedIndicator {
            position,
            reason: reason.into(),
        }
    }

    /// True for failures of the underlying file or socket, including error
    /// statuses relayed by a remote server.
    pub fn is_storage_io(&self) -> bool {
        matches!(self, TagFrameError::Io(_) | TagFrameError::Remote(_))
    }
}

impl From<std::string::FromUtf8Error> for TagFrameError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        TagFrameError::InvalidUtf8(e.to_string())
    }
}

impl From<bincode::Error> for TagFrameError {
    fn from(e: bincode::Error) -> Self {
        TagFrameError::Serialization(e.to_string())
    }
}

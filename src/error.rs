//! Crate-level error types.

use thiserror::Error;

use crate::ax25::FrameError;

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on the TNC link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A received buffer could not be decoded as an AX.25 frame.
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    /// A mode name with no entry in the mode registry.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// The link to the TNC has been closed.
    #[error("link closed")]
    LinkClosed,
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;

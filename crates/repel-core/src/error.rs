//! Error types returned by the connection engine.

use thiserror::Error;

/// Failure modes of [`crate::connection::Connection::embed`] and
/// [`crate::connection::Connection::authenticate`].
///
/// The upstream C API collapses all of these into a single signed/zero
/// return code; splitting them out lets callers match on the actual cause
/// instead of re-deriving it from a magic number.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The parser did not recognize the packet's framing at all.
    #[error("packet does not match the configured protocol framing")]
    Malformed,

    /// The buffer is a valid prefix of a packet but is missing at least
    /// `missing` more bytes.
    #[error("packet is incomplete, missing at least {missing} more byte(s)")]
    Incomplete {
        /// Minimum number of additional bytes required.
        missing: usize,
    },
    /// `embed` was called on a packet whose parsed length does not match
    /// the buffer it was given; `embed` only accepts whole, well-formed
    /// packets.
    #[error("parsed packet length {parsed} does not match supplied buffer length {buffer}")]
    LengthMismatch {
        /// Length reported by the parser.
        parsed: usize,
        /// Length of the buffer that was actually supplied.
        buffer: usize,
    },
    /// The parser reported too little (or no) carrier capacity to hold a
    /// MAC alongside the configured nonce width.
    #[error("packet does not have enough embeddable capacity for a MAC")]
    NoCapacity,
}

impl ConnectionError {
    /// Whether retrying with more buffered data could plausibly succeed.
    ///
    /// Only [`ConnectionError::Incomplete`] describes a condition that more
    /// input resolves; the others are permanent for the given bytes.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectionError::Incomplete { .. })
    }
}

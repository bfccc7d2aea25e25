//! Wire-level errors.

use thiserror::Error;

/// Errors from encoding or decoding wire frames and protocol envelopes.
#[derive(Debug, Error)]
pub enum WireError {
    /// The topic exceeds the 65 535-byte frame limit. Hard encode failure.
    #[error("topic length {0} exceeds frame limit")]
    TopicTooLong(usize),

    /// The frame or envelope could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The envelope carries a protocol version this build does not speak.
    #[error("unsupported protocol version {0:?}")]
    UnsupportedVersion(String),
}

//! Wire codec and protocol messages for lockmesh.
//!
//! Two layers:
//!
//! 1. **Frame**: `[topic_len: u16 LE][topic: UTF-8][payload]` — the binary
//!    envelope every transport message travels in ([`encode_frame`] /
//!    [`decode_frame`]).
//! 2. **Protocol**: JSON envelopes `{ v, ts, msg }` carried as the payload
//!    of frames on the [`NODE_TOPIC`] topic, where `msg` is a tagged
//!    [`NodeMessage`].
//!
//! Decode failures map onto the protocol error taxonomy: malformed bytes or
//! JSON fail with [`WireError::MalformedFrame`], an unknown envelope version
//! fails with [`WireError::UnsupportedVersion`]. Both are dropped (with a
//! warn log) by the receiving node rather than treated as fatal.

mod error;
mod frame;
mod protocol;

pub use error::WireError;
pub use frame::{decode_frame, encode_frame, TransportMessage, MAX_TOPIC_LEN};
pub use protocol::{
    decode_envelope, encode_envelope, Envelope, NodeMessage, NODE_TOPIC, PROTOCOL_VERSION,
};

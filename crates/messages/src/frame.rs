//! Binary topic framing.

use crate::WireError;

/// Maximum topic length in bytes (the length prefix is a u16).
pub const MAX_TOPIC_LEN: usize = u16::MAX as usize;

/// A topic-addressed message as handed to / received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Channel name, UTF-8.
    pub topic: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl TransportMessage {
    /// Create a message on the given topic.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Encode a message as `[topic_len: u16 LE][topic][payload]`.
pub fn encode_frame(message: &TransportMessage) -> Result<Vec<u8>, WireError> {
    let topic = message.topic.as_bytes();
    if topic.len() > MAX_TOPIC_LEN {
        return Err(WireError::TopicTooLong(topic.len()));
    }

    let mut out = Vec::with_capacity(2 + topic.len() + message.payload.len());
    out.extend_from_slice(&(topic.len() as u16).to_le_bytes());
    out.extend_from_slice(topic);
    out.extend_from_slice(&message.payload);
    Ok(out)
}

/// Decode a frame back into a [`TransportMessage`].
pub fn decode_frame(bytes: &[u8]) -> Result<TransportMessage, WireError> {
    if bytes.len() < 2 {
        return Err(WireError::MalformedFrame(format!(
            "frame too short: {} bytes",
            bytes.len()
        )));
    }

    let topic_len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let rest = &bytes[2..];
    if rest.len() < topic_len {
        return Err(WireError::MalformedFrame(format!(
            "topic length {} exceeds frame body {}",
            topic_len,
            rest.len()
        )));
    }

    let topic = std::str::from_utf8(&rest[..topic_len])
        .map_err(|e| WireError::MalformedFrame(format!("topic is not UTF-8: {e}")))?
        .to_string();

    Ok(TransportMessage {
        topic,
        payload: rest[topic_len..].to_vec(),
    })
}

//! The envelope exchanged between a connector and its remote peer.
//!
//! One envelope is one transport message, encoded as a JSON object:
//!
//! ```text
//! {"event": "RemoteCommand",
//!  "payload": {"__command__": "ping"},
//!  "routing": {"message-routing": [{"dst_peer": "node1", ...}]},
//!  "message_type": "subscribing"}
//! ```
//!
//! `routing` and `message_type` are omitted when empty.

use crate::routing::{Frame, MESSAGE_ROUTING, RoutingStacks};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum encoded envelope size: 1MB
pub const MAX_ENVELOPE_SIZE: usize = 1024 * 1024;

/// Payload map carried by an envelope.
pub type Payload = serde_json::Map<String, Value>;

/// Marks an envelope as subscription control rather than an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Subscribing,
    Unsubscribing,
}

/// An (event, payload) pair plus its routing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "RoutingStacks::is_empty")]
    pub routing: RoutingStacks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, payload: Payload) -> Self {
        Self {
            event: event.into(),
            payload,
            routing: RoutingStacks::new(),
            message_type: None,
        }
    }

    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    /// Push a frame onto the message-routing stack.
    pub fn push_frame(&mut self, frame: Frame) {
        self.routing.push(MESSAGE_ROUTING, frame);
    }

    pub fn peek_frame(&self) -> Option<&Frame> {
        self.routing.peek(MESSAGE_ROUTING)
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.routing.pop(MESSAGE_ROUTING)
    }

    /// Build the answer to this envelope.
    ///
    /// The answer carries this envelope's routing with the top frame
    /// reversed, and an empty payload: nothing else of the request survives.
    pub fn answer(&self, event: impl Into<String>) -> Envelope {
        Envelope {
            event: event.into(),
            payload: Payload::new(),
            routing: self.routing.reversed_top(MESSAGE_ROUTING),
            message_type: None,
        }
    }

    /// String field of the payload, empty when absent or not a string.
    pub fn str_field(&self, key: &str) -> &str {
        self.payload.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Integer field of the payload.
    pub fn int_field(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }

    /// Encode to transport bytes.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::EmptyEvent` for an envelope without an event
    /// name, and `CodecError::TooLarge` past [`MAX_ENVELOPE_SIZE`].
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.event.is_empty() {
            return Err(CodecError::EmptyEvent);
        }
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_ENVELOPE_SIZE {
            return Err(CodecError::TooLarge {
                size: bytes.len(),
                max: MAX_ENVELOPE_SIZE,
            });
        }
        Ok(bytes)
    }

    /// Decode from transport bytes.
    pub fn decode(data: &[u8]) -> Result<Envelope, CodecError> {
        if data.len() > MAX_ENVELOPE_SIZE {
            return Err(CodecError::TooLarge {
                size: data.len(),
                max: MAX_ENVELOPE_SIZE,
            });
        }
        let envelope: Envelope = serde_json::from_slice(data)?;
        if envelope.event.is_empty() {
            return Err(CodecError::EmptyEvent);
        }
        Ok(envelope)
    }
}

/// Error encoding or decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("envelope has no event name")]
    EmptyEvent,
    #[error("envelope of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

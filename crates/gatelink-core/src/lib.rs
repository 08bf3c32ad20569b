//! Core types for gatelink.
//!
//! This crate provides the wire primitives shared by every connector: the
//! envelope and its codec, routing frames, peer addresses and the identity
//! payload exchanged during the handshake. Nothing here performs I/O.

mod address;
mod envelope;
mod identity;
mod routing;

pub use address::{AddressParseError, PeerAddress};
pub use envelope::{CodecError, Envelope, MAX_ENVELOPE_SIZE, MessageType, Payload};
pub use identity::{IdentityCard, NodeIdentity, merge_missing};
pub use routing::{Frame, MESSAGE_ROUTING, RoutingStacks};

/// Event names understood by every connector.
pub mod events {
    /// Handshake offer carrying the local identity payload.
    pub const IDENTITY_OFFER: &str = "IdentityOffer";
    /// Handshake acknowledgement; `result < 0` is a rejection.
    pub const IDENTITY_ACK: &str = "IdentityAck";
    pub const REMOTE_COMMAND: &str = "RemoteCommand";
    pub const REMOTE_COMMAND_ANSWER: &str = "RemoteCommandAnswer";
    pub const REMOTE_STATS: &str = "RemoteStats";
    pub const REMOTE_STATS_ANSWER: &str = "RemoteStatsAnswer";
    pub const PLAY_PEER: &str = "PlayPeer";
    pub const PLAY_PEER_ACK: &str = "PlayPeerAck";
    pub const PAUSE_PEER: &str = "PausePeer";
    pub const PAUSE_PEER_ACK: &str = "PausePeerAck";
}

/// Reserved payload keys.
pub mod keys {
    pub const RESULT: &str = "result";
    pub const COMMENT: &str = "comment";
    pub const DATA: &str = "data";
    pub const COMMAND: &str = "__command__";
    pub const STATS: &str = "__stats__";
    pub const SERVICE: &str = "__service__";
    pub const CONFIG: &str = "__config__";
    pub const GLOBAL: &str = "__global__";
    pub const FILTER: &str = "__filter__";
}

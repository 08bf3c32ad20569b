//! Error types for connector operations.

use gatelink_core::CodecError;
use thiserror::Error;

/// Errors returned to a local caller.
///
/// Anything the remote peer does wrong is not an error here: it becomes a
/// logged [`Violation`] and a transport drop.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Command or stats requested while no session is open.
    #[error("no session with peer {peer}")]
    NotInSession { peer: String },

    /// The outbound envelope could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Protocol violations committed by the remote peer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("event {0:?} is not accepted before the session is open")]
    UnexpectedEvent(String),

    #[error("frame is addressed to role {0:?}")]
    RoleMismatch(String),

    #[error("frame is addressed to peer {0:?}")]
    PeerMismatch(String),

    #[error("frame is addressed to unknown service {0:?}")]
    UnknownService(String),

    #[error("subscription control messages are not accepted")]
    SubscriptionControl,

    #[error("undecodable envelope: {0}")]
    Undecodable(String),
}

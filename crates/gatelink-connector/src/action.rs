//! What goes into a connector and what comes out of it.

use crate::host::{ServiceRef, Subscription};
use gatelink_core::{Envelope, Payload, events, keys};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Role, name and service of a peer as learned from the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIdentity {
    pub role: String,
    pub name: String,
    pub service: String,
}

/// The two request/answer families carried by the RPC bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcKind {
    Command,
    Stats,
}

impl RpcKind {
    pub fn request_event(self) -> &'static str {
        match self {
            RpcKind::Command => events::REMOTE_COMMAND,
            RpcKind::Stats => events::REMOTE_STATS,
        }
    }

    pub fn answer_event(self) -> &'static str {
        match self {
            RpcKind::Command => events::REMOTE_COMMAND_ANSWER,
            RpcKind::Stats => events::REMOTE_STATS_ANSWER,
        }
    }

    /// Payload key naming the command or stats id.
    pub fn name_key(self) -> &'static str {
        match self {
            RpcKind::Command => keys::COMMAND,
            RpcKind::Stats => keys::STATS,
        }
    }
}

/// A local request to run a command or collect stats on the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub name: String,
    pub payload: Payload,
    /// Local service the answer is routed back to.
    pub requester: ServiceRef,
    /// Remote service; empty means the wanted peer service.
    pub service: String,
}

impl Request {
    pub fn new(name: impl Into<String>, payload: Payload, requester: ServiceRef) -> Self {
        Self {
            name: name.into(),
            payload,
            requester,
            service: String::new(),
        }
    }

    pub fn to_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

/// One item of the connector's serial input queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// The transport is up.
    Connected,
    /// One transport message arrived.
    RxData(Vec<u8>),
    /// The transport is down.
    Disconnected,
    /// The ack timer fired.
    Timeout,
    /// Drop the transport.
    Drop,
    SendCommand(Request),
    SendStats(Request),
    SubscriptionAdded(Subscription),
    SubscriptionRemoved(Subscription),
    /// A local service finished a request it previously left pending.
    LocalAnswer {
        kind: RpcKind,
        request: Envelope,
        answer: Payload,
    },
}

/// Discriminant of [`Input`], used to index the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Connected,
    RxData,
    Disconnected,
    Timeout,
    Drop,
    SendCommand,
    SendStats,
    SubscriptionAdded,
    SubscriptionRemoved,
    LocalAnswer,
}

impl InputKind {
    pub const COUNT: usize = 10;

    /// Requests made by a local caller, who expects an error when refused.
    pub fn is_local_request(self) -> bool {
        matches!(self, InputKind::SendCommand | InputKind::SendStats)
    }
}

impl Input {
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Connected => InputKind::Connected,
            Input::RxData(_) => InputKind::RxData,
            Input::Disconnected => InputKind::Disconnected,
            Input::Timeout => InputKind::Timeout,
            Input::Drop => InputKind::Drop,
            Input::SendCommand(_) => InputKind::SendCommand,
            Input::SendStats(_) => InputKind::SendStats,
            Input::SubscriptionAdded(_) => InputKind::SubscriptionAdded,
            Input::SubscriptionRemoved(_) => InputKind::SubscriptionRemoved,
            Input::LocalAnswer { .. } => InputKind::LocalAnswer,
        }
    }
}

/// Who receives connector notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Parent,
    Service(ServiceRef),
}

/// Session lifecycle announcements.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A session opened. `data` is the `data` field of the ack.
    Open { peer: PeerIdentity, data: Value },
    /// The session closed.
    Close { peer: PeerIdentity },
    /// The peer refused our identity; carries the whole ack payload.
    IdNak { payload: Payload },
}

/// Side effects requested by the connector, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write one encoded envelope to the transport.
    Send(Vec<u8>),
    /// Drop the transport connection.
    Drop,
    ArmTimer(Duration),
    ClearTimer,
    Notify { to: Recipient, notice: Notice },
    Deliver { service: ServiceRef, envelope: Envelope },
    ForwardToParent(Envelope),
    Publish(Envelope),
}

//! Connection states and the transition table.
//!
//! ```text
//!  Disconnected --Connected--> AwaitingAck --IdentityAck(>=0)--> Session
//!       ^                          |                                |
//!       +-------Disconnected-------+----------Disconnected----------+
//! ```
//!
//! The table maps `(State, InputKind)` to a handler. An empty cell means the
//! input is not accepted in that state.

use crate::action::{Action, Input, InputKind};
use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::host::Context;

/// Lifecycle state of a connector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Disconnected,
    AwaitingAck,
    Session,
}

impl State {
    pub const COUNT: usize = 3;
}

pub(crate) type Handler =
    fn(&mut Connector, &Context<'_>, Input, &mut Vec<Action>) -> Result<(), ConnectorError>;

const ON_CONNECTED: Option<Handler> = Some(Connector::on_connected as Handler);
const ON_RX_DATA: Option<Handler> = Some(Connector::on_rx_data as Handler);
const ON_DISCONNECTED: Option<Handler> = Some(Connector::on_disconnected as Handler);
const ON_TIMEOUT: Option<Handler> = Some(Connector::on_timeout as Handler);
const ON_DROP: Option<Handler> = Some(Connector::on_drop as Handler);
const ON_REQUEST: Option<Handler> = Some(Connector::on_send_request as Handler);
const ON_SUB_ADDED: Option<Handler> = Some(Connector::on_subscription_added as Handler);
const ON_SUB_REMOVED: Option<Handler> = Some(Connector::on_subscription_removed as Handler);
const ON_LOCAL_ANSWER: Option<Handler> = Some(Connector::on_local_answer as Handler);

/// Columns follow `InputKind` declaration order.
#[rustfmt::skip]
const TABLE: [[Option<Handler>; InputKind::COUNT]; State::COUNT] = [
    // Connected     RxData      Disconnected     Timeout     Drop     SendCommand SendStats   SubAdded      SubRemoved      LocalAnswer
    [ON_CONNECTED,   None,       None,            None,       ON_DROP, None,       None,       None,         None,           None],            // Disconnected
    [None,           ON_RX_DATA, ON_DISCONNECTED, ON_TIMEOUT, ON_DROP, None,       None,       None,         None,           None],            // AwaitingAck
    [None,           ON_RX_DATA, ON_DISCONNECTED, None,       ON_DROP, ON_REQUEST, ON_REQUEST, ON_SUB_ADDED, ON_SUB_REMOVED, ON_LOCAL_ANSWER], // Session
];

pub(crate) fn lookup(state: State, input: InputKind) -> Option<Handler> {
    TABLE[state as usize][input as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_requests_only_in_session() {
        for kind in [InputKind::SendCommand, InputKind::SendStats] {
            assert!(lookup(State::Disconnected, kind).is_none());
            assert!(lookup(State::AwaitingAck, kind).is_none());
            assert!(lookup(State::Session, kind).is_some());
        }
    }

    #[test]
    fn drop_is_accepted_everywhere() {
        for state in [State::Disconnected, State::AwaitingAck, State::Session] {
            assert!(lookup(state, InputKind::Drop).is_some());
        }
    }

    #[test]
    fn timeout_only_matters_while_waiting() {
        assert!(lookup(State::AwaitingAck, InputKind::Timeout).is_some());
        assert!(lookup(State::Session, InputKind::Timeout).is_none());
        assert!(lookup(State::Disconnected, InputKind::Timeout).is_none());
    }

    #[test]
    fn connected_only_from_disconnected() {
        assert!(lookup(State::Disconnected, InputKind::Connected).is_some());
        assert!(lookup(State::AwaitingAck, InputKind::Connected).is_none());
        assert!(lookup(State::Session, InputKind::Connected).is_none());
    }
}

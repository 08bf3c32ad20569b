//! Inbound dispatch.
//!
//! Before the session opens only the identity ack is accepted. Inside a
//! session the top frame must be addressed to this node (role, then peer
//! name), subscription control is refused, connector-owned events are
//! handled here, and everything else goes to a local service, the parent, or
//! the local bus.

use crate::action::{Action, Input, RpcKind};
use crate::config::{Delivery, ServicePolicy};
use crate::connector::Connector;
use crate::error::{ConnectorError, Violation};
use crate::host::Context;
use crate::state::State;
use gatelink_core::{Envelope, PeerAddress, events};
use tracing::debug;

impl Connector {
    pub(crate) fn on_rx_data(
        &mut self,
        cx: &Context<'_>,
        input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        let Input::RxData(bytes) = input else {
            return Ok(());
        };
        self.metrics_mut().envelopes_received += 1;
        if self.state() != State::Session && self.is_attempt_closed() {
            debug!(peer = %self.peer_label(), bytes = bytes.len(), "attempt dropped, data ignored");
            return Ok(());
        }
        match Envelope::decode(&bytes) {
            Ok(envelope) => self.route(cx, envelope, out),
            Err(e) => self.violation(cx, Violation::Undecodable(e.to_string()), "", out),
        }
        Ok(())
    }

    fn route(&mut self, cx: &Context<'_>, envelope: Envelope, out: &mut Vec<Action>) {
        debug!(event = %envelope.event, peer = %self.peer_label(), "rx");

        if self.state() != State::Session {
            if envelope.event == events::IDENTITY_ACK {
                self.on_identity_ack(cx, envelope, out);
            } else {
                let violation = Violation::UnexpectedEvent(envelope.event.clone());
                self.violation(cx, violation, &envelope.event, out);
            }
            return;
        }

        if let Some(violation) = self.check_addressing(cx, &envelope) {
            self.violation(cx, violation, &envelope.event, out);
            return;
        }

        match envelope.event.as_str() {
            events::IDENTITY_ACK => self.on_identity_ack(cx, envelope, out),
            events::PLAY_PEER => self.on_admin(cx, envelope, events::PLAY_PEER_ACK, true, out),
            events::PAUSE_PEER => self.on_admin(cx, envelope, events::PAUSE_PEER_ACK, false, out),
            events::REMOTE_COMMAND => self.on_remote_request(cx, RpcKind::Command, envelope, out),
            events::REMOTE_STATS => self.on_remote_request(cx, RpcKind::Stats, envelope, out),
            events::REMOTE_COMMAND_ANSWER | events::REMOTE_STATS_ANSWER => self.on_rpc_answer(cx, envelope, out),
            _ => self.deliver(cx, envelope, out),
        }
    }

    /// Reject envelopes not addressed to this node.
    fn check_addressing(&self, cx: &Context<'_>, envelope: &Envelope) -> Option<Violation> {
        if let Some(frame) = envelope.peek_frame() {
            if !frame.dst_role.is_empty() && frame.dst_role != cx.node.role {
                return Some(Violation::RoleMismatch(frame.dst_role.clone()));
            }

            if !frame.dst_peer.is_empty() {
                match frame.dst_peer.parse::<PeerAddress>() {
                    Ok(addr) if addr.name() == cx.node.name => {}
                    _ => return Some(Violation::PeerMismatch(frame.dst_peer.clone())),
                }
            }

            if self.config().service_policy == ServicePolicy::Enforce
                && !frame.dst_service.is_empty()
                && cx.services.resolve(&frame.dst_service).is_none()
            {
                return Some(Violation::UnknownService(frame.dst_service.clone()));
            }
        }

        if envelope.message_type.is_some() {
            return Some(Violation::SubscriptionControl);
        }
        None
    }

    /// Hand an event to the local service it names, if that service takes it
    /// from outside.
    fn deliver(&mut self, cx: &Context<'_>, envelope: Envelope, out: &mut Vec<Action>) {
        let target = envelope
            .peek_frame()
            .map(|frame| frame.dst_service.as_str())
            .filter(|name| !name.is_empty())
            .and_then(|name| cx.services.resolve(name))
            .filter(|service| cx.services.is_public(service, &envelope.event));
        match target {
            Some(service) => out.push(Action::Deliver { service, envelope }),
            None => self.fall_through(envelope, out),
        }
    }

    /// Events no local service claimed.
    pub(crate) fn fall_through(&self, envelope: Envelope, out: &mut Vec<Action>) {
        match self.config().delivery {
            Delivery::PureChild => out.push(Action::ForwardToParent(envelope)),
            Delivery::Publish => out.push(Action::Publish(envelope)),
        }
    }
}

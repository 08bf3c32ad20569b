//! The per-peer connector.

use crate::action::{Action, Input, Notice, PeerIdentity, Recipient, Request};
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, Violation};
use crate::host::{Context, ServiceRef};
use crate::metrics::ConnectorMetrics;
use crate::state::{self, State};
use gatelink_core::{Envelope, Frame, NodeIdentity, Payload, keys};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Protocol endpoint for one remote peer.
///
/// A connector performs no I/O: it consumes one [`Input`] at a time and
/// returns the [`Action`]s its owner must carry out, in order.
#[derive(Debug)]
pub struct Connector {
    config: ConnectorConfig,
    state: State,
    confirmed_peer: PeerIdentity,
    /// An Open was emitted and its Close is still owed.
    inform_on_close: bool,
    timer_armed: bool,
    /// The current connection attempt was dropped before its session
    /// opened; nothing more is taken from it.
    attempt_closed: bool,
    metrics: ConnectorMetrics,
}

impl Connector {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            state: State::Disconnected,
            confirmed_peer: PeerIdentity::default(),
            inform_on_close: false,
            timer_armed: false,
            attempt_closed: false,
            metrics: ConnectorMetrics::default(),
        }
    }

    /// Handle one input.
    ///
    /// # Errors
    ///
    /// Only local requests fail: `NotInSession` outside a session, `Codec`
    /// when the request cannot be encoded. Peer misbehaviour never surfaces
    /// here; it turns into an `Action::Drop`.
    pub fn handle(&mut self, cx: &Context<'_>, input: Input) -> Result<Vec<Action>, ConnectorError> {
        let kind = input.kind();
        let mut out = Vec::new();
        match state::lookup(self.state, kind) {
            Some(handler) => handler(self, cx, input, &mut out)?,
            None if kind.is_local_request() => {
                return Err(ConnectorError::NotInSession {
                    peer: self.peer_label(),
                });
            }
            None => debug!(state = ?self.state, input = ?kind, peer = %self.peer_label(), "input ignored"),
        }
        Ok(out)
    }

    /// Ask the peer to run `request` as a command. The answer arrives later
    /// as a `RemoteCommandAnswer` delivered to the requester.
    pub fn send_command(&mut self, cx: &Context<'_>, request: Request) -> Result<Vec<Action>, ConnectorError> {
        self.handle(cx, Input::SendCommand(request))
    }

    /// Ask the peer for stats. The answer arrives as `RemoteStatsAnswer`.
    pub fn send_stats(&mut self, cx: &Context<'_>, request: Request) -> Result<Vec<Action>, ConnectorError> {
        self.handle(cx, Input::SendStats(request))
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_in_session(&self) -> bool {
        self.state == State::Session
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Peer identity learned from the last successful handshake.
    pub fn confirmed_peer(&self) -> &PeerIdentity {
        &self.confirmed_peer
    }

    pub fn inform_on_close(&self) -> bool {
        self.inform_on_close
    }

    pub fn metrics(&self) -> ConnectorMetrics {
        self.metrics
    }

    /// Name under which the subscription registry knows this connector.
    pub fn name(&self) -> &str {
        if self.config.name.is_empty() {
            &self.config.wanted_peer_name
        } else {
            &self.config.name
        }
    }

    /// Build the frame for a request leaving this node.
    ///
    /// An empty `destination_service` falls back to the wanted peer service,
    /// which is sent empty if it is empty too.
    pub fn build_frame(&self, node: &NodeIdentity, local_source: &str, destination_service: &str) -> Frame {
        let dst_service = if destination_service.is_empty() {
            self.config.wanted_peer_service.clone()
        } else {
            destination_service.to_string()
        };
        Frame {
            dst_peer: self.config.wanted_peer_name.clone(),
            dst_role: self.config.wanted_peer_role.clone(),
            dst_service,
            src_peer: node.name.clone(),
            src_role: node.role.clone(),
            src_service: local_source.to_string(),
            user: node.username.clone(),
            host: node.host.clone(),
        }
    }

    pub(crate) fn on_connected(
        &mut self,
        cx: &Context<'_>,
        _input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        self.state = State::AwaitingAck;
        self.attempt_closed = false;
        let offer = self.identity_offer(cx);
        if let Err(e) = self.send(offer, out) {
            warn!(peer = %self.peer_label(), error = %e, "cannot encode identity offer");
            self.close_attempt(out);
            return Ok(());
        }
        out.push(Action::ArmTimer(self.config.ack_timeout()));
        self.timer_armed = true;
        Ok(())
    }

    pub(crate) fn on_disconnected(
        &mut self,
        _cx: &Context<'_>,
        _input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        self.state = State::Disconnected;
        self.clear_timer(out);
        if self.inform_on_close {
            self.inform_on_close = false;
            info!(peer = %self.peer_label(), "session closed");
            self.notify(
                Notice::Close {
                    peer: self.confirmed_peer.clone(),
                },
                out,
            );
        }
        Ok(())
    }

    pub(crate) fn on_timeout(
        &mut self,
        cx: &Context<'_>,
        _input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        // a timeout queued behind the ack that cleared it
        if !self.timer_armed {
            return Ok(());
        }
        self.timer_armed = false;
        self.metrics.handshake_timeouts += 1;
        warn!(
            role = %cx.node.role,
            name = %cx.node.name,
            peer = %self.peer_label(),
            timeout_ms = self.config.ack_timeout_ms,
            "identity not acknowledged in time"
        );
        self.close_attempt(out);
        Ok(())
    }

    pub(crate) fn on_drop(
        &mut self,
        _cx: &Context<'_>,
        _input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        self.push_drop(out);
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub(crate) fn set_confirmed_peer(&mut self, peer: PeerIdentity) {
        self.confirmed_peer = peer;
    }

    /// Record that an Open is about to be emitted. Returns false if one is
    /// already outstanding.
    pub(crate) fn mark_open(&mut self) -> bool {
        !std::mem::replace(&mut self.inform_on_close, true)
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut ConnectorMetrics {
        &mut self.metrics
    }

    pub(crate) fn clear_timer(&mut self, out: &mut Vec<Action>) {
        if self.timer_armed {
            self.timer_armed = false;
            out.push(Action::ClearTimer);
        }
    }

    /// Encode and queue one envelope for the transport.
    pub(crate) fn send(&mut self, envelope: Envelope, out: &mut Vec<Action>) -> Result<(), ConnectorError> {
        let bytes = envelope.encode()?;
        debug!(event = %envelope.event, peer = %self.peer_label(), bytes = bytes.len(), "tx");
        self.metrics.envelopes_sent += 1;
        out.push(Action::Send(bytes));
        Ok(())
    }

    /// Drop the transport and give up on the handshake in progress.
    pub(crate) fn close_attempt(&mut self, out: &mut Vec<Action>) {
        self.attempt_closed = true;
        self.push_drop(out);
    }

    pub(crate) fn is_attempt_closed(&self) -> bool {
        self.attempt_closed
    }

    pub(crate) fn push_drop(&mut self, out: &mut Vec<Action>) {
        self.metrics.drops += 1;
        out.push(Action::Drop);
    }

    pub(crate) fn notify(&self, notice: Notice, out: &mut Vec<Action>) {
        let to = match &self.config.subscriber {
            Some(name) => Recipient::Service(ServiceRef::new(name.clone())),
            None => Recipient::Parent,
        };
        out.push(Action::Notify { to, notice });
    }

    /// Log a violation and drop the transport.
    pub(crate) fn violation(&mut self, cx: &Context<'_>, violation: Violation, event: &str, out: &mut Vec<Action>) {
        self.metrics.violations += 1;
        warn!(
            role = %cx.node.role,
            name = %cx.node.name,
            peer = %self.peer_label(),
            event,
            "protocol violation: {violation}"
        );
        if self.state == State::AwaitingAck {
            self.close_attempt(out);
        } else {
            self.push_drop(out);
        }
    }

    /// Short description of the peer for logs.
    pub(crate) fn peer_label(&self) -> String {
        let peer = if self.confirmed_peer.name.is_empty() {
            &self.config.wanted_peer_name
        } else {
            &self.confirmed_peer.name
        };
        let role = if self.confirmed_peer.role.is_empty() {
            &self.config.wanted_peer_role
        } else {
            &self.confirmed_peer.role
        };
        format!("{role}^{peer}")
    }

    pub(crate) fn error_payload(result: i64, comment: impl Into<String>) -> Payload {
        let mut payload = Payload::new();
        payload.insert(keys::RESULT.to_string(), Value::from(result));
        payload.insert(keys::COMMENT.to_string(), Value::String(comment.into()));
        payload
    }
}

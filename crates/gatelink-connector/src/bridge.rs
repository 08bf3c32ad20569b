//! Command and stats bridge.
//!
//! Outbound requests carry one frame pushed by this node; the routing stack
//! is the only correlation between a request and its answer. Inbound
//! requests are run against the local service directory and answered with
//! the request's top frame reversed.

use crate::action::{Action, Input, RpcKind};
use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::host::{Context, Reply};
use gatelink_core::{Envelope, Payload, keys};
use serde_json::Value;
use tracing::{debug, warn};

/// `result` of an answer for a service this node does not host.
pub const SERVICE_NOT_FOUND: i64 = -100;

/// `result` of an answer to a request that named no command or stats.
pub const BAD_REQUEST: i64 = -1;

impl Connector {
    pub(crate) fn on_send_request(
        &mut self,
        cx: &Context<'_>,
        input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        let (kind, request) = match input {
            Input::SendCommand(request) => (RpcKind::Command, request),
            Input::SendStats(request) => (RpcKind::Stats, request),
            _ => return Ok(()),
        };

        let mut payload = request.payload;
        payload.insert(kind.name_key().to_string(), Value::String(request.name));
        if !request.service.is_empty() {
            payload.insert(keys::SERVICE.to_string(), Value::String(request.service.clone()));
        }

        let mut envelope = Envelope::new(kind.request_event(), payload);
        envelope.push_frame(self.build_frame(cx.node, request.requester.name(), &request.service));
        self.send(envelope, out)
    }

    pub(crate) fn on_local_answer(
        &mut self,
        _cx: &Context<'_>,
        input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        if let Input::LocalAnswer { kind, request, answer } = input {
            self.send_answer(kind, &request, answer, out);
        }
        Ok(())
    }

    /// The peer asks this node to run a command or collect stats.
    pub(crate) fn on_remote_request(
        &mut self,
        cx: &Context<'_>,
        kind: RpcKind,
        request: Envelope,
        out: &mut Vec<Action>,
    ) {
        let name = request.str_field(kind.name_key());
        if name.is_empty() {
            let answer = Self::error_payload(BAD_REQUEST, format!("{} without {}", kind.request_event(), kind.name_key()));
            self.send_answer(kind, &request, answer, out);
            return;
        }

        let service_name = request.str_field(keys::SERVICE);
        let Some(service) = cx.resolve_service(service_name) else {
            let shown = if service_name.is_empty() { &cx.node.service } else { service_name };
            let answer = Self::error_payload(SERVICE_NOT_FOUND, format!("Service '{shown}' not found"));
            self.send_answer(kind, &request, answer, out);
            return;
        };

        let reply = match kind {
            RpcKind::Command => cx.services.command(&service, name, &request),
            RpcKind::Stats => cx.services.stats(&service, name, &request),
        };
        match reply {
            Reply::Ready(answer) => self.send_answer(kind, &request, answer, out),
            Reply::Pending => debug!(service = %service, name, "answer pending"),
        }
    }

    /// An answer to one of our own requests came back.
    pub(crate) fn on_rpc_answer(&mut self, cx: &Context<'_>, answer: Envelope, out: &mut Vec<Action>) {
        let requester = answer
            .peek_frame()
            .map(|frame| frame.dst_service.as_str())
            .filter(|name| !name.is_empty())
            .and_then(|name| cx.services.resolve(name));
        match requester {
            Some(service) => out.push(Action::Deliver { service, envelope: answer }),
            None => self.fall_through(answer, out),
        }
    }

    /// `PlayPeer` and `PausePeer`: run them on the local runtime and answer
    /// with the result code.
    pub(crate) fn on_admin(&mut self, cx: &Context<'_>, request: Envelope, answer_event: &str, play: bool, out: &mut Vec<Action>) {
        let result = if play { cx.runtime.play() } else { cx.runtime.pause() };
        let mut answer = request.answer(answer_event);
        answer.payload.insert(keys::RESULT.to_string(), Value::from(result));
        if let Err(e) = self.send(answer, out) {
            warn!(peer = %self.peer_label(), error = %e, "cannot send {answer_event}");
        }
    }

    fn send_answer(&mut self, kind: RpcKind, request: &Envelope, payload: Payload, out: &mut Vec<Action>) {
        let mut answer = request.answer(kind.answer_event());
        answer.payload = payload;
        if let Err(e) = self.send(answer, out) {
            warn!(peer = %self.peer_label(), error = %e, "cannot send {}", kind.answer_event());
        }
    }
}

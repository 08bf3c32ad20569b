//! Identity handshake.
//!
//! On connect the connector offers its identity and arms the ack timer. The
//! peer answers with `IdentityAck`; a non-negative `result` opens the
//! session and the ack's top frame tells us who the peer says it is.

use crate::action::{Action, Notice, PeerIdentity};
use crate::connector::Connector;
use crate::host::Context;
use crate::state::State;
use gatelink_core::{Envelope, IdentityCard, events, keys};
use serde_json::Value;
use tracing::{debug, info, warn};

/// `result` assumed when an ack carries none.
const MISSING_RESULT: i64 = -1;

impl Connector {
    /// The `IdentityOffer` envelope for this connection attempt.
    pub(crate) fn identity_offer(&self, cx: &Context<'_>) -> Envelope {
        let card = IdentityCard::new(cx.node, self.config().credential.clone(), cx.runtime.is_playing());
        let mut offer = Envelope::new(events::IDENTITY_OFFER, card.into_payload(&self.config().extra_info));
        offer.push_frame(self.build_frame(cx.node, &cx.node.service, ""));
        offer
    }

    pub(crate) fn on_identity_ack(&mut self, cx: &Context<'_>, ack: Envelope, out: &mut Vec<Action>) {
        if self.state() == State::Session {
            debug!(peer = %self.peer_label(), "late identity ack ignored");
            return;
        }
        if self.is_attempt_closed() {
            debug!(peer = %self.peer_label(), "identity ack after the attempt was dropped ignored");
            return;
        }
        self.clear_timer(out);

        let result = ack.int_field(keys::RESULT).unwrap_or(MISSING_RESULT);
        if result < 0 {
            self.metrics_mut().identity_rejections += 1;
            warn!(
                role = %cx.node.role,
                name = %cx.node.name,
                peer = %self.peer_label(),
                result,
                comment = ack.str_field(keys::COMMENT),
                "identity refused"
            );
            self.close_attempt(out);
            self.notify(Notice::IdNak { payload: ack.payload }, out);
            return;
        }

        let peer = ack
            .peek_frame()
            .map(|frame| PeerIdentity {
                role: frame.src_role.clone(),
                name: frame.src_peer.clone(),
                service: frame.src_service.clone(),
            })
            .unwrap_or_default();
        self.set_confirmed_peer(peer);
        self.set_state(State::Session);
        self.metrics_mut().sessions_opened += 1;
        info!(peer = %self.peer_label(), service = %self.confirmed_peer().service, "session open");

        if self.mark_open() {
            let data = ack.payload.get(keys::DATA).cloned().unwrap_or(Value::Null);
            self.notify(
                Notice::Open {
                    peer: self.confirmed_peer().clone(),
                    data,
                },
                out,
            );
        }

        self.resync(cx, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Input;
    use crate::config::ConnectorConfig;
    use crate::testkit::*;
    use gatelink_core::Payload;
    use serde_json::json;

    fn offer_for(host: &FakeHost, config: ConnectorConfig) -> Envelope {
        let mut connector = Connector::new(config);
        let actions = connector.handle(&host.cx(), Input::Connected).unwrap();
        sent(&actions).remove(0)
    }

    #[test]
    fn offer_carries_identity_and_credential() {
        let host = FakeHost::new();
        host.runtime.playing.set(true);
        let mut config = ConnectorConfig::new(PEER_ROLE, PEER_NAME);
        config.credential = "jwt-token".into();

        let offer = offer_for(&host, config);
        assert_eq!(offer.str_field("role"), LOCAL_ROLE);
        assert_eq!(offer.str_field("name"), LOCAL_NAME);
        assert_eq!(offer.str_field("credential"), "jwt-token");
        assert_eq!(offer.payload["playing"], json!(true));
        assert_eq!(offer.payload["pid"], json!(std::process::id()));

        let frame = offer.peek_frame().unwrap();
        assert_eq!(frame.dst_role, PEER_ROLE);
        assert_eq!(frame.dst_peer, PEER_NAME);
        assert_eq!(frame.src_service, "console");
    }

    #[test]
    fn extra_info_does_not_overwrite_identity() {
        let host = FakeHost::new();
        let mut config = ConnectorConfig::new(PEER_ROLE, PEER_NAME);
        config.extra_info = object(json!({"name": "impostor", "rack": "r7"}));

        let offer = offer_for(&host, config);
        assert_eq!(offer.str_field("name"), LOCAL_NAME);
        assert_eq!(offer.str_field("rack"), "r7");
    }

    #[test]
    fn ack_without_result_is_a_rejection() {
        let host = FakeHost::new();
        let mut connector = connector();
        connector.handle(&host.cx(), Input::Connected).unwrap();

        let bytes = inbound(events::IDENTITY_ACK, Payload::new(), from_peer());
        let actions = connector.handle(&host.cx(), Input::RxData(bytes)).unwrap();

        assert!(!connector.is_in_session());
        assert_eq!(drops(&actions), 1);
        assert!(matches!(notices(&actions)[..], [Notice::IdNak { .. }]));
        assert_eq!(connector.metrics().identity_rejections, 1);
    }

    #[test]
    fn ack_without_frame_opens_with_unknown_peer() {
        let host = FakeHost::new();
        let mut connector = connector();
        connector.handle(&host.cx(), Input::Connected).unwrap();

        let bytes = Envelope::new(events::IDENTITY_ACK, object(json!({"result": 0})))
            .encode()
            .unwrap();
        let actions = connector.handle(&host.cx(), Input::RxData(bytes)).unwrap();

        assert!(connector.is_in_session());
        assert_eq!(connector.confirmed_peer(), &PeerIdentity::default());
        assert!(matches!(
            notices(&actions)[..],
            [Notice::Open { data: Value::Null, .. }]
        ));
    }

    #[test]
    fn credential_is_not_learned_from_ack() {
        let host = FakeHost::new();
        let mut config = ConnectorConfig::new(PEER_ROLE, PEER_NAME);
        config.credential = "mine".into();
        let mut connector = Connector::new(config);
        connector.handle(&host.cx(), Input::Connected).unwrap();

        let mut ack = Envelope::new(events::IDENTITY_ACK, object(json!({"result": 0, "credential": "theirs"})));
        ack.push_frame(from_peer());
        connector
            .handle(&host.cx(), Input::RxData(ack.encode().unwrap()))
            .unwrap();

        assert_eq!(connector.config().credential, "mine");
    }
}

//! Fake collaborators for connector tests.

use crate::action::{Action, Input, Notice};
use crate::config::ConnectorConfig;
use crate::connector::Connector;
use crate::host::{Context, Reply, Runtime, ServiceDirectory, ServiceRef, Subscription, SubscriptionRegistry};
use gatelink_core::{Envelope, Frame, NodeIdentity, Payload, events};
use serde_json::{Value, json};
use std::cell::Cell;
use std::collections::HashMap;

pub(crate) const LOCAL_ROLE: &str = "gate";
pub(crate) const LOCAL_NAME: &str = "local1";
pub(crate) const PEER_ROLE: &str = "svc-a";
pub(crate) const PEER_NAME: &str = "node1";

/// Commands that leave their answer pending.
pub(crate) const SLOW_COMMAND: &str = "slow";

pub(crate) fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[derive(Default)]
pub(crate) struct FakeServices {
    /// service name -> public events
    services: HashMap<String, Vec<String>>,
}

impl FakeServices {
    pub(crate) fn add(&mut self, name: &str, public_events: &[&str]) {
        self.services
            .insert(name.to_string(), public_events.iter().map(|e| e.to_string()).collect());
    }
}

impl ServiceDirectory for FakeServices {
    fn resolve(&self, name: &str) -> Option<ServiceRef> {
        self.services.contains_key(name).then(|| ServiceRef::new(name))
    }

    fn is_public(&self, service: &ServiceRef, event: &str) -> bool {
        self.services
            .get(service.name())
            .is_some_and(|events| events.iter().any(|e| e == event))
    }

    fn command(&self, service: &ServiceRef, command: &str, _request: &Envelope) -> Reply {
        if command == SLOW_COMMAND {
            return Reply::Pending;
        }
        Reply::Ready(object(json!({
            "result": 0,
            "data": {"service": service.name(), "command": command},
        })))
    }

    fn stats(&self, service: &ServiceRef, stats: &str, _request: &Envelope) -> Reply {
        Reply::Ready(object(json!({
            "result": 0,
            "data": {"service": service.name(), "stats": stats, "uptime": 42},
        })))
    }
}

#[derive(Default)]
pub(crate) struct FakeSubscriptions(pub(crate) Vec<Subscription>);

impl SubscriptionRegistry for FakeSubscriptions {
    fn subscriptions(&self, connector: &str) -> Vec<Subscription> {
        assert_eq!(connector, PEER_NAME);
        self.0.clone()
    }
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub(crate) playing: Cell<bool>,
}

impl Runtime for FakeRuntime {
    fn is_playing(&self) -> bool {
        self.playing.get()
    }

    fn play(&self) -> i64 {
        if self.playing.replace(true) { -1 } else { 0 }
    }

    fn pause(&self) -> i64 {
        if self.playing.replace(false) { 0 } else { -1 }
    }
}

pub(crate) struct FakeHost {
    pub(crate) node: NodeIdentity,
    pub(crate) services: FakeServices,
    pub(crate) subscriptions: FakeSubscriptions,
    pub(crate) runtime: FakeRuntime,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        let mut node = NodeIdentity::from_env(LOCAL_ROLE, LOCAL_NAME);
        node.service = "console".into();
        node.username = "ops".into();
        node.host = "box".into();

        let mut services = FakeServices::default();
        services.add("console", &["Alarm"]);
        services.add("agent", &["Heartbeat"]);

        Self {
            node,
            services,
            subscriptions: FakeSubscriptions::default(),
            runtime: FakeRuntime::default(),
        }
    }

    pub(crate) fn cx(&self) -> Context<'_> {
        Context {
            node: &self.node,
            services: &self.services,
            subscriptions: &self.subscriptions,
            runtime: &self.runtime,
        }
    }
}

pub(crate) fn connector() -> Connector {
    Connector::new(ConnectorConfig::new(PEER_ROLE, PEER_NAME))
}

/// Drive a fresh connector into `Session`.
pub(crate) fn in_session(host: &FakeHost, config: ConnectorConfig) -> Connector {
    let mut connector = Connector::new(config);
    connector.handle(&host.cx(), Input::Connected).unwrap();
    connector
        .handle(&host.cx(), Input::RxData(ack(0, PEER_ROLE, PEER_NAME)))
        .unwrap();
    assert!(connector.is_in_session());
    connector
}

/// Frame of an envelope sent by the peer to this node.
pub(crate) fn from_peer() -> Frame {
    Frame {
        dst_peer: LOCAL_NAME.into(),
        dst_role: LOCAL_ROLE.into(),
        dst_service: String::new(),
        src_peer: PEER_NAME.into(),
        src_role: PEER_ROLE.into(),
        src_service: "agent".into(),
        user: "remote".into(),
        host: "far".into(),
    }
}

pub(crate) fn ack(result: i64, src_role: &str, src_peer: &str) -> Vec<u8> {
    let mut envelope = Envelope::new(
        events::IDENTITY_ACK,
        object(json!({"result": result, "data": {"motd": "hi"}})),
    );
    envelope.push_frame(Frame {
        src_role: src_role.into(),
        src_peer: src_peer.into(),
        src_service: "agent".into(),
        ..from_peer()
    });
    envelope.encode().unwrap()
}

pub(crate) fn inbound(event: &str, payload: Payload, frame: Frame) -> Vec<u8> {
    let mut envelope = Envelope::new(event, payload);
    envelope.push_frame(frame);
    envelope.encode().unwrap()
}

pub(crate) fn sent(actions: &[Action]) -> Vec<Envelope> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Send(bytes) => Some(Envelope::decode(bytes).unwrap()),
            _ => None,
        })
        .collect()
}

pub(crate) fn drops(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::Drop)).count()
}

pub(crate) fn notices(actions: &[Action]) -> Vec<&Notice> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Notify { notice, .. } => Some(notice),
            _ => None,
        })
        .collect()
}

/// Actions that hand an inbound envelope to someone local.
pub(crate) fn handoffs(actions: &[Action]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, Action::Deliver { .. } | Action::ForwardToParent(_) | Action::Publish(_)))
        .count()
}

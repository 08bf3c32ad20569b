//! Collaborators the connector consults while handling an input.
//!
//! A connector never owns any of these. The host builds them once at start
//! and lends them to every connector through a [`Context`].

use gatelink_core::{Envelope, NodeIdentity, Payload};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a local service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRef(String);

impl ServiceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of running a command or stats request locally.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The answer payload is available now.
    Ready(Payload),
    /// The service answers later through `Input::LocalAnswer`.
    Pending,
}

/// Local services reachable by name.
pub trait ServiceDirectory {
    fn resolve(&self, name: &str) -> Option<ServiceRef>;

    /// Whether `service` accepts `event` from outside.
    fn is_public(&self, service: &ServiceRef, event: &str) -> bool;

    fn command(&self, service: &ServiceRef, command: &str, request: &Envelope) -> Reply;

    fn stats(&self, service: &ServiceRef, stats: &str, request: &Envelope) -> Reply;
}

/// A subscription held by a local subscriber on a connector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscription {
    /// Empty for implicit, catch-all subscriptions.
    pub event: String,
    pub config: Payload,
    pub global: Payload,
    pub filter: Payload,
    /// Remote service to subscribe on; empty means the wanted peer service.
    pub target_service: String,
    pub subscriber: String,
}

/// Owner of the subscription bookkeeping.
pub trait SubscriptionRegistry {
    /// Subscriptions currently held on the connector named `connector`.
    fn subscriptions(&self, connector: &str) -> Vec<Subscription>;
}

/// Play/pause control of the hosting runtime.
pub trait Runtime {
    fn is_playing(&self) -> bool;

    /// Returns the result code sent back to the peer.
    fn play(&self) -> i64;

    fn pause(&self) -> i64;
}

/// Read-only process-wide state lent to a connector for one input.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub node: &'a NodeIdentity,
    pub services: &'a dyn ServiceDirectory,
    pub subscriptions: &'a dyn SubscriptionRegistry,
    pub runtime: &'a dyn Runtime,
}

impl Context<'_> {
    /// Resolve a service by name; an empty name means the node's default
    /// service.
    pub fn resolve_service(&self, name: &str) -> Option<ServiceRef> {
        let name = if name.is_empty() { &self.node.service } else { name };
        if name.is_empty() {
            return None;
        }
        self.services.resolve(name)
    }
}

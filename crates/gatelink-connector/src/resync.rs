//! Subscription resynchronization.
//!
//! Every session starts with the peer knowing nothing about our
//! subscriptions, so each explicit one is announced again. Implicit
//! (empty-event) subscriptions stay local. The peer is expected to treat
//! repeated announcements idempotently.

use crate::action::{Action, Input};
use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::host::{Context, Subscription};
use gatelink_core::{Envelope, MessageType, Payload, keys};
use serde_json::Value;
use tracing::{debug, warn};

impl Connector {
    /// Announce every explicit subscription. Returns how many were sent.
    pub(crate) fn resync(&mut self, cx: &Context<'_>, out: &mut Vec<Action>) -> usize {
        let subscriptions = cx.subscriptions.subscriptions(self.name());
        let mut sent = 0;
        for subscription in subscriptions.iter().filter(|s| !s.event.is_empty()) {
            if self.announce(cx, subscription, MessageType::Subscribing, out) {
                sent += 1;
            }
        }
        debug!(peer = %self.peer_label(), sent, "subscriptions resynchronized");
        sent
    }

    pub(crate) fn on_subscription_added(
        &mut self,
        cx: &Context<'_>,
        input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        if let Input::SubscriptionAdded(subscription) = input
            && !subscription.event.is_empty()
        {
            self.announce(cx, &subscription, MessageType::Subscribing, out);
        }
        Ok(())
    }

    pub(crate) fn on_subscription_removed(
        &mut self,
        cx: &Context<'_>,
        input: Input,
        out: &mut Vec<Action>,
    ) -> Result<(), ConnectorError> {
        if let Input::SubscriptionRemoved(subscription) = input
            && !subscription.event.is_empty()
        {
            self.announce(cx, &subscription, MessageType::Unsubscribing, out);
        }
        Ok(())
    }

    fn announce(
        &mut self,
        cx: &Context<'_>,
        subscription: &Subscription,
        message_type: MessageType,
        out: &mut Vec<Action>,
    ) -> bool {
        let mut payload = Payload::new();
        payload.insert(keys::CONFIG.to_string(), Value::Object(subscription.config.clone()));
        payload.insert(keys::GLOBAL.to_string(), Value::Object(subscription.global.clone()));
        payload.insert(keys::FILTER.to_string(), Value::Object(subscription.filter.clone()));

        let mut envelope = Envelope::new(subscription.event.clone(), payload).with_message_type(message_type);
        envelope.push_frame(self.build_frame(cx.node, &subscription.subscriber, &subscription.target_service));

        match self.send(envelope, out) {
            Ok(()) => true,
            Err(e) => {
                warn!(peer = %self.peer_label(), event = %subscription.event, error = %e, "cannot announce subscription");
                false
            }
        }
    }
}

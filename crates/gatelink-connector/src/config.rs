//! Connector configuration.

use gatelink_core::Payload;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time allowed for the peer to acknowledge our identity.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 5000;

/// Where inbound events nobody local claims end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Publish on the local bus for any interested subscriber.
    #[default]
    Publish,
    /// Forward strictly to the parent actor.
    PureChild,
}

/// How strictly a frame's `dst_service` is checked on arrival.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePolicy {
    /// Carried but not checked; one node may host many services.
    #[default]
    Advisory,
    /// A non-empty `dst_service` must resolve locally.
    Enforce,
}

/// Configuration of one connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Name used to look up this connector's subscriptions. Empty means the
    /// wanted peer name.
    pub name: String,
    pub wanted_peer_role: String,
    pub wanted_peer_name: String,
    pub wanted_peer_service: String,
    pub ack_timeout_ms: u64,
    /// Opaque credential offered in the identity payload.
    pub credential: String,
    /// Extra identity fields; never overwrite the reserved ones.
    pub extra_info: Payload,
    /// Receiver of Open/Close/IdNak. `None` means the parent.
    pub subscriber: Option<String>,
    pub delivery: Delivery,
    pub service_policy: ServicePolicy,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            wanted_peer_role: String::new(),
            wanted_peer_name: String::new(),
            wanted_peer_service: String::new(),
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            credential: String::new(),
            extra_info: Payload::new(),
            subscriber: None,
            delivery: Delivery::default(),
            service_policy: ServicePolicy::default(),
        }
    }
}

impl ConnectorConfig {
    /// Target a peer by role and name.
    pub fn new(wanted_peer_role: impl Into<String>, wanted_peer_name: impl Into<String>) -> Self {
        Self {
            wanted_peer_role: wanted_peer_role.into(),
            wanted_peer_name: wanted_peer_name.into(),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.wanted_peer_service = service.into();
        self
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.ack_timeout(), Duration::from_millis(5000));
        assert_eq!(config.delivery, Delivery::Publish);
        assert_eq!(config.service_policy, ServicePolicy::Advisory);
        assert!(config.subscriber.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ConnectorConfig = serde_json::from_str(
            r#"{"wanted_peer_role": "svc-a", "delivery": "pure_child", "extra_info": {"site": "lab"}}"#,
        )
        .unwrap();
        assert_eq!(config.wanted_peer_role, "svc-a");
        assert_eq!(config.delivery, Delivery::PureChild);
        assert_eq!(config.ack_timeout_ms, DEFAULT_ACK_TIMEOUT_MS);
        assert_eq!(config.extra_info["site"], "lab");
    }
}

//! Daemon configuration file.
//!
//! ```toml
//! [node]
//! role = "gate"
//! name = "edge-1"
//!
//! [peer]
//! url = "ws://10.0.0.5:1991"
//!
//! [connector]
//! wanted_peer_role = "controlcenter"
//! wanted_peer_name = "cc-1"
//!
//! [[subscriptions]]
//! event = "Alarm"
//! ```

use anyhow::Context as _;
use gatelink_connector::{ConnectorConfig, Subscription};
use gatelink_core::{NodeIdentity, Payload};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub node: NodeSection,
    pub peer: PeerSection,
    pub connector: ConnectorConfig,
    pub subscriptions: Vec<SubscriptionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    pub role: String,
    pub name: String,
    /// Service answering requests that name none.
    pub service: String,
    pub tag: String,
    pub version: String,
    pub release: String,
    pub required_services: Vec<String>,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            role: "gatelink".into(),
            name: String::new(),
            service: crate::services::CONSOLE.into(),
            tag: String::new(),
            version: env!("CARGO_PKG_VERSION").into(),
            release: String::new(),
            required_services: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerSection {
    pub url: String,
    pub reconnect_delay_ms: u64,
}

impl Default for PeerSection {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:1991".into(),
            reconnect_delay_ms: 2000,
        }
    }
}

impl PeerSection {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// A subscription announced to the peer on every session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionEntry {
    pub event: String,
    pub target_service: String,
    pub subscriber: Option<String>,
    pub config: Payload,
    pub global: Payload,
    pub filter: Payload,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn node_identity(&self) -> NodeIdentity {
        let name = if self.node.name.is_empty() {
            format!("{}-{}", self.node.role, std::process::id())
        } else {
            self.node.name.clone()
        };
        let mut node = NodeIdentity::from_env(self.node.role.clone(), name);
        node.service = self.node.service.clone();
        node.tag = self.node.tag.clone();
        node.version = self.node.version.clone();
        node.release = self.node.release.clone();
        node.required_services = self.node.required_services.clone();
        node
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .iter()
            .map(|entry| Subscription {
                event: entry.event.clone(),
                config: entry.config.clone(),
                global: entry.global.clone(),
                filter: entry.filter.clone(),
                target_service: entry.target_service.clone(),
                subscriber: entry
                    .subscriber
                    .clone()
                    .unwrap_or_else(|| self.node.service.clone()),
            })
            .collect()
    }
}

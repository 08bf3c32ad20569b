//! Node identity and the identity payload offered during the handshake.

use crate::envelope::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only, process-wide description of the local node.
///
/// Built once at start-up and shared by reference with every connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub role: String,
    pub name: String,
    /// Service answering requests that name no service.
    pub service: String,
    pub id: String,
    pub tag: String,
    pub version: String,
    pub release: String,
    pub runtime_version: String,
    pub pid: u32,
    pub watcher_pid: u32,
    pub username: String,
    pub host: String,
    pub launch_id: String,
    pub start_date: String,
    pub node_uuid: String,
    pub required_services: Vec<String>,
}

impl NodeIdentity {
    /// Describe this process, filling OS-derived fields from the environment.
    pub fn from_env(role: impl Into<String>, name: impl Into<String>) -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            role: role.into(),
            name: name.into(),
            service: String::new(),
            id: uuid::Uuid::new_v4().to_string(),
            tag: String::new(),
            version: String::new(),
            release: String::new(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            pid: std::process::id(),
            watcher_pid: 0,
            username,
            host,
            launch_id: uuid::Uuid::new_v4().to_string(),
            start_date: chrono::Utc::now().to_rfc3339(),
            node_uuid: uuid::Uuid::new_v4().to_string(),
            required_services: Vec::new(),
        }
    }
}

/// The identity payload sent as `IdentityOffer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityCard {
    pub role: String,
    pub id: String,
    pub name: String,
    pub tag: String,
    pub version: String,
    pub release: String,
    pub runtime_version: String,
    pub playing: bool,
    pub pid: u32,
    pub watcher_pid: u32,
    /// Opaque; never read back from the peer.
    pub credential: String,
    pub username: String,
    pub launch_id: String,
    pub start_date: String,
    pub node_uuid: String,
    pub required_services: Vec<String>,
}

impl IdentityCard {
    pub fn new(node: &NodeIdentity, credential: impl Into<String>, playing: bool) -> Self {
        Self {
            role: node.role.clone(),
            id: node.id.clone(),
            name: node.name.clone(),
            tag: node.tag.clone(),
            version: node.version.clone(),
            release: node.release.clone(),
            runtime_version: node.runtime_version.clone(),
            playing,
            pid: node.pid,
            watcher_pid: node.watcher_pid,
            credential: credential.into(),
            username: node.username.clone(),
            launch_id: node.launch_id.clone(),
            start_date: node.start_date.clone(),
            node_uuid: node.node_uuid.clone(),
            required_services: node.required_services.clone(),
        }
    }

    /// Render as a payload, adding `extra` keys that are not already set.
    pub fn into_payload(self, extra: &Payload) -> Payload {
        let mut payload = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Payload::new(),
        };
        merge_missing(&mut payload, extra);
        payload
    }
}

/// Copy every key of `extra` into `target` unless `target` already has it.
pub fn merge_missing(target: &mut Payload, extra: &Payload) {
    for (key, value) in extra {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
        }
    }
}

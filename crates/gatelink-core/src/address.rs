//! Peer addresses as carried in a frame's `dst_peer`.
//!
//! Format: `name` or `name^service`. The service qualifier is advisory and is
//! stripped before a receiver compares the name with its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the peer name and an optional service qualifier.
pub const SERVICE_SEPARATOR: char = '^';

/// A peer name with an optional service qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress {
    name: String,
    service: Option<String>,
}

impl PeerAddress {
    /// Address a peer by name only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: None,
        }
    }

    /// Address a specific service hosted by a peer.
    pub fn with_service(name: impl Into<String>, service: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            name: name.into(),
            service: (!service.is_empty()).then_some(service),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{}{}{}", self.name, SERVICE_SEPARATOR, service),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for PeerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, service) = match s.split_once(SERVICE_SEPARATOR) {
            Some((name, service)) => (name, service),
            None => (s, ""),
        };

        if name.is_empty() {
            return Err(AddressParseError::EmptyName(s.to_string()));
        }

        Ok(Self::with_service(name, service))
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = AddressParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PeerAddress> for String {
    fn from(addr: PeerAddress) -> Self {
        addr.to_string()
    }
}

/// Error parsing a peer address.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddressParseError {
    #[error("peer address has an empty name: {0:?}")]
    EmptyName(String),
}

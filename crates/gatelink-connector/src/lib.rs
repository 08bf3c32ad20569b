//! Session connector for gatelink.
//!
//! A [`Connector`] lets local services run commands, collect stats and
//! receive events on one remote peer. It is a plain state machine: the owner
//! feeds it transport and timer [`Input`]s one at a time, lends it a
//! [`Context`] with the process-wide collaborators, and carries out the
//! [`Action`]s it returns.
//!
//! ```ignore
//! let mut connector = Connector::new(ConnectorConfig::new("svc-a", "node1"));
//! for action in connector.handle(&cx, Input::Connected)? {
//!     execute(action);
//! }
//! ```

mod action;
mod bridge;
mod config;
mod connector;
mod error;
mod handshake;
mod host;
mod metrics;
mod resync;
mod router;
mod state;

#[cfg(test)]
mod testkit;

pub use action::{Action, Input, InputKind, Notice, PeerIdentity, Recipient, Request, RpcKind};
pub use bridge::{BAD_REQUEST, SERVICE_NOT_FOUND};
pub use config::{ConnectorConfig, DEFAULT_ACK_TIMEOUT_MS, Delivery, ServicePolicy};
pub use connector::Connector;
pub use error::{ConnectorError, Violation};
pub use host::{Context, Reply, Runtime, ServiceDirectory, ServiceRef, Subscription, SubscriptionRegistry};
pub use metrics::ConnectorMetrics;
pub use state::State;

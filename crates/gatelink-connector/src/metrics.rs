//! Per-connector counters.

use serde::Serialize;

/// Counters kept by one connector over its whole life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectorMetrics {
    pub envelopes_sent: u64,
    pub envelopes_received: u64,
    pub drops: u64,
    pub violations: u64,
    pub sessions_opened: u64,
    pub identity_rejections: u64,
    pub handshake_timeouts: u64,
}

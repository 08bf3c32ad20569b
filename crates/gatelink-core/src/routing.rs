//! Routing frames.
//!
//! Every hop that sends a request pushes exactly one [`Frame`] onto the
//! envelope's stack for its area. Answers travel back by reversing the top
//! frame; the terminal consumer either leaves it in place (several local
//! consumers may need it) or pops it when it owns the end of the chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The only area id used by the session protocol.
pub const MESSAGE_ROUTING: &str = "message-routing";

/// One addressing record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub dst_peer: String,
    pub dst_role: String,
    pub dst_service: String,
    pub src_peer: String,
    pub src_role: String,
    pub src_service: String,
    pub user: String,
    pub host: String,
}

impl Frame {
    /// The frame an answer travels with: source and destination swapped,
    /// user and host kept.
    pub fn reversed(&self) -> Frame {
        Frame {
            dst_peer: self.src_peer.clone(),
            dst_role: self.src_role.clone(),
            dst_service: self.src_service.clone(),
            src_peer: self.dst_peer.clone(),
            src_role: self.dst_role.clone(),
            src_service: self.dst_service.clone(),
            user: self.user.clone(),
            host: self.host.clone(),
        }
    }
}

/// Frame stacks keyed by area id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingStacks(BTreeMap<String, Vec<Frame>>);

impl RoutingStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame, creating the area's stack if needed.
    pub fn push(&mut self, area: &str, frame: Frame) {
        self.0.entry(area.to_string()).or_default().push(frame);
    }

    /// The top frame, without mutation.
    pub fn peek(&self, area: &str) -> Option<&Frame> {
        self.0.get(area).and_then(|stack| stack.last())
    }

    /// Remove and return the top frame. An emptied area is removed.
    pub fn pop(&mut self, area: &str) -> Option<Frame> {
        let stack = self.0.get_mut(area)?;
        let frame = stack.pop();
        if stack.is_empty() {
            self.0.remove(area);
        }
        frame
    }

    pub fn depth(&self, area: &str) -> usize {
        self.0.get(area).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// A copy of these stacks with the top frame of `area` reversed.
    ///
    /// This is what an answer carries back: the routing metadata of the
    /// request and nothing else.
    pub fn reversed_top(&self, area: &str) -> RoutingStacks {
        let mut stacks = self.clone();
        if let Some(top) = stacks.0.get_mut(area).and_then(|stack| stack.last_mut()) {
            *top = top.reversed();
        }
        stacks
    }
}

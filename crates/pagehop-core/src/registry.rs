//! Anchor bookkeeping across discovery passes.
//!
//! The registry is what keeps repeated discovery runs idempotent: an anchor
//! moves from *discovered* to *listening* exactly once, re-discovery is a
//! no-op, and an anchor already listening is skipped before any handler
//! creation (and therefore any fetch) can start.
//!
//! Listening is recorded *before* handler creation awaits the cache. A
//! re-entrant discovery pass that runs while an earlier pass is still
//! resolving a handler sees the anchor as taken and leaves it alone.

use std::collections::{HashMap, HashSet};

use crate::dom::NodeId;
use crate::handler::Handler;

enum ListenerState {
    /// Slot reserved; handler creation is still awaiting the cache.
    Creating,
    /// Activation handler in place.
    Installed(Handler),
}

/// Tracks which anchors have been evaluated and which hold a handler.
#[derive(Default)]
pub struct AnchorRegistry {
    discovered: HashSet<NodeId>,
    hover_armed: HashSet<NodeId>,
    excluded: HashSet<NodeId>,
    listening: HashMap<NodeId, ListenerState>,
}

impl AnchorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an anchor discovered. Returns `false` if it already was.
    pub fn discover(&mut self, anchor: NodeId) -> bool {
        self.discovered.insert(anchor)
    }

    /// Whether the anchor has been discovered.
    #[must_use]
    pub fn is_discovered(&self, anchor: NodeId) -> bool {
        self.discovered.contains(&anchor)
    }

    /// Arm a hover listener for an anchor. Returns `false` if already armed,
    /// so a rescan never attaches a second hover listener.
    pub fn arm_hover(&mut self, anchor: NodeId) -> bool {
        self.hover_armed.insert(anchor)
    }

    /// Exclude an anchor from interception (cross-origin). Returns `false`
    /// if it was already excluded, so the new-context attribute is written
    /// once. Excluded anchors never enter the listening set.
    pub fn exclude(&mut self, anchor: NodeId) -> bool {
        self.excluded.insert(anchor)
    }

    /// Whether the anchor is excluded from interception.
    #[must_use]
    pub fn is_excluded(&self, anchor: NodeId) -> bool {
        self.excluded.contains(&anchor)
    }

    /// Reserve the listening slot for an anchor ahead of handler creation.
    /// Returns `false` if the anchor already holds (or is resolving) a
    /// handler.
    pub fn begin_listening(&mut self, anchor: NodeId) -> bool {
        if self.listening.contains_key(&anchor) {
            return false;
        }
        self.listening.insert(anchor, ListenerState::Creating);
        true
    }

    /// Install the resolved handler for an anchor.
    pub fn install(&mut self, anchor: NodeId, handler: Handler) {
        self.listening.insert(anchor, ListenerState::Installed(handler));
    }

    /// Whether the anchor holds or is resolving a handler.
    #[must_use]
    pub fn is_listening(&self, anchor: NodeId) -> bool {
        self.listening.contains_key(&anchor)
    }

    /// The installed handler for an anchor, if resolution has completed.
    #[must_use]
    pub fn handler(&self, anchor: NodeId) -> Option<Handler> {
        match self.listening.get(&anchor) {
            Some(ListenerState::Installed(handler)) => Some(handler.clone()),
            _ => None,
        }
    }

    /// Number of anchors holding or resolving a handler.
    #[must_use]
    pub fn listening_count(&self) -> usize {
        self.listening.len()
    }
}

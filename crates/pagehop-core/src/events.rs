//! Broadcast notifications emitted around the navigation lifecycle.
//!
//! These are fire-and-forget: emitting with no subscribers is not an error,
//! and a slow subscriber lagging off the end of the channel loses old events
//! rather than blocking the router. Consumers that need to know when the DOM
//! has actually been updated should synchronize on [`RouterEvent::Change`],
//! not on the return of an activation call.

use tokio::sync::broadcast;

/// Channel capacity. Navigation events are low-volume; this only matters for
/// subscribers that stop polling.
const EVENT_CAPACITY: usize = 64;

/// Consumer-observable router notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    /// A discovery pass is about to scan for anchors. Extension point for
    /// consumers to inject anchors before the scan.
    Build,
    /// A document finished its first fetch into the cache.
    InitialLoad {
        /// Absolute URL of the fetched document.
        url: String,
    },
    /// A document fetch failed; navigation will fall through to default
    /// browser behavior for anchors pointing at this URL.
    FailLoad {
        /// Absolute URL that failed to load.
        url: String,
    },
    /// A transition completed and the live DOM was swapped.
    Change {
        /// Absolute URL now shown.
        url: String,
    },
}

impl RouterEvent {
    /// Wire name of the event, as a host page would observe it.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Build => "router:build",
            Self::InitialLoad { .. } => "router:initialLoad",
            Self::FailLoad { .. } => "router:failLoad",
            Self::Change { .. } => "router:change",
        }
    }
}

/// Fire-and-forget broadcast bus for [`RouterEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RouterEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus with no subscribers yet.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to all events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is fine.
    pub fn emit(&self, event: RouterEvent) {
        let _ = self.sender.send(event);
    }
}

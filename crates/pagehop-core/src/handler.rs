//! Activation handlers and the events that trigger them.
//!
//! The original closure-per-anchor design is reified as data: an anchor's
//! resolved handler is either a [`Handler::Transition`] bound to a cached
//! URL, or [`Handler::Noop`] when the prefetch failed and navigation should
//! fall through to the browser. Activation behavior lives on the router;
//! handlers deliberately carry no mutable state, which is what makes
//! repeated activation deterministic.

use std::time::Duration;

use crate::cache::DocumentCache;

/// Delay before the post-transition catch-up discovery pass, for content
/// inserted by replayed scripts. A best-effort heuristic, not a guarantee.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Resolved activation handler for an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Intercept activation and swap in the cached document for `url`.
    Transition {
        /// Absolute URL whose cached document this handler applies.
        url: String,
    },
    /// Do nothing; the prefetch failed, default navigation applies.
    Noop,
}

/// Resolve the handler for `url` through the document cache.
///
/// Issues the fetch on a cache miss (single-flight with any concurrent
/// caller). A failed fetch resolves to [`Handler::Noop`] rather than an
/// error: "no handler installed" is the contract for falling back to
/// default browser behavior.
pub async fn create_handler(cache: &DocumentCache, url: &str) -> Handler {
    match cache.get(url).await {
        Some(_) => Handler::Transition {
            url: url.to_string(),
        },
        None => Handler::Noop,
    }
}

/// An activation (click-like) event delivered to the router.
///
/// Models the only two things the router needs from a host event: whether
/// default behavior can be suppressed, and whether it has been.
#[derive(Debug, Clone)]
pub struct ActivationEvent {
    cancelable: bool,
    default_prevented: bool,
}

impl Default for ActivationEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationEvent {
    /// A cancelable activation, the common case.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cancelable: true,
            default_prevented: false,
        }
    }

    /// An activation whose default behavior cannot be suppressed.
    #[must_use]
    pub const fn non_cancelable() -> Self {
        Self {
            cancelable: false,
            default_prevented: false,
        }
    }

    /// Suppress default behavior, if the event supports it.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Whether default behavior was suppressed. When `false` after an
    /// activation, the host should perform its normal navigation.
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

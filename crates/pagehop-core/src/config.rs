//! Router construction options.
//!
//! Options mirror what a host page would pass when instantiating the router:
//! whether to emit chatty diagnostics, whether to prefetch eagerly, whether
//! prefetching is gated behind pointer hover, and which subtree of the
//! document anchor discovery should scan.
//!
//! ## Examples
//!
//! ```rust
//! use pagehop_core::RouterOptions;
//!
//! // Eager prefetch, quiet logs (the defaults)
//! let options = RouterOptions::default();
//! assert!(options.preload);
//! assert!(!options.hover_only);
//!
//! // Hover-gated prefetch with diagnostics
//! let options = RouterOptions {
//!     log: true,
//!     hover_only: true,
//!     ..RouterOptions::default()
//! };
//! assert!(options.hover_only);
//! ```

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Options controlling discovery policy and diagnostics.
///
/// The two discovery policies are mutually exclusive and selected at
/// construction: when `hover_only` is set, anchors are only evaluated (and
/// their documents fetched) after the host reports a pointer-enter for them;
/// otherwise every same-origin anchor is prefetched at discovery time,
/// provided `preload` is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Emit per-link diagnostic log lines (the hit/fetch/fail chatter).
    pub log: bool,
    /// Prefetch same-origin anchors ahead of click. Ignored under
    /// `hover_only`, where hover is what triggers the fetch. When disabled
    /// (and not hover-gated), discovery attaches no handlers at all and
    /// default browser navigation applies.
    pub preload: bool,
    /// Gate discovery behind pointer hover instead of prefetching eagerly.
    pub hover_only: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            log: false,
            preload: true,
            hover_only: false,
        }
    }
}

/// Scope root for anchor discovery.
///
/// The router either scans the whole live document or a single element's
/// subtree. Scroll notifications are interpreted against the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Scan the whole document (the default).
    #[default]
    Document,
    /// Scan only the subtree rooted at this element.
    Within(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_eager_quiet_profile() {
        let options = RouterOptions::default();
        assert!(!options.log);
        assert!(options.preload);
        assert!(!options.hover_only);
    }

    #[test]
    fn options_round_trip_through_serde() {
        let options = RouterOptions {
            log: true,
            preload: false,
            hover_only: true,
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: RouterOptions = serde_json::from_str(&json).unwrap();
        assert!(back.log);
        assert!(!back.preload);
        assert!(back.hover_only);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let options: RouterOptions = serde_json::from_str("{}").unwrap();
        assert!(options.preload);
    }
}

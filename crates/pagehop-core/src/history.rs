//! Browser history synchronization.
//!
//! The bridge owns the navigation state stack and guards every write: a new
//! entry is pushed only when the current entry's URL differs, so a handler
//! firing repeatedly for the already-current URL never piles up duplicate
//! history entries.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Absolute URL of the entry.
    pub url: String,
}

/// Duplicate-suppressing history stack.
#[derive(Debug, Default)]
pub struct HistoryBridge {
    entries: Vec<NavigationState>,
}

impl HistoryBridge {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new entry for `url` unless it is already current.
    /// Returns whether an entry was written.
    pub fn change_state(&mut self, url: &str) -> bool {
        if self.entries.last().is_some_and(|state| state.url == url) {
            debug!("history unchanged, \"{}\" already current", url);
            return false;
        }
        self.entries.push(NavigationState {
            url: url.to_string(),
        });
        true
    }

    /// The current entry, if any navigation has been recorded.
    #[must_use]
    pub fn current(&self) -> Option<&NavigationState> {
        self.entries.last()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[NavigationState] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_always_lands() {
        let mut history = HistoryBridge::new();
        assert!(history.change_state("/about"));
        assert_eq!(history.current().map(|s| s.url.as_str()), Some("/about"));
    }

    #[test]
    fn repeated_writes_for_current_url_are_suppressed() {
        let mut history = HistoryBridge::new();
        assert!(history.change_state("/about"));
        assert!(!history.change_state("/about"));
        assert!(!history.change_state("/about"));
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn alternating_urls_each_get_an_entry() {
        let mut history = HistoryBridge::new();
        assert!(history.change_state("/a"));
        assert!(history.change_state("/b"));
        assert!(history.change_state("/a"));
        assert_eq!(history.entries().len(), 3);
    }
}

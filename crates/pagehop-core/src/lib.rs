//! # pagehop-core
//!
//! Core functionality for pagehop - client-side navigation interception for
//! multi-page sites that should feel like single-page apps.
//!
//! The router intercepts same-origin link activations, fetches target
//! documents ahead of (or at) click time, caches the markup per URL, and
//! swaps the visible page without a full navigation: the body is replaced
//! wholesale, the head is diff-merged so shared stylesheets never flash,
//! scripts are re-executed through an explicit replay step, and the history
//! stack is kept in sync without duplicate entries.
//!
//! Everything is headless by design: the DOM is an owned arena parsed with
//! `html5ever`, fetching goes through the [`PageFetcher`] trait, and script
//! execution goes through the [`ScriptRunner`] trait, so the whole
//! navigation lifecycle is drivable and assertable from plain tests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagehop_core::{ActivationEvent, Result, Router, RouterOptions};
//!
//! # async fn example() -> Result<()> {
//! let html = r#"<body><a href="/about">About</a></body>"#;
//! let router = Router::mount_default(html, "https://mysite.com/", RouterOptions::default()).await?;
//!
//! // Deliver a click; the cached document is swapped in.
//! if let Some(anchor) = router.find_anchor("/about") {
//!     let mut event = ActivationEvent::new();
//!     router.activate(anchor, &mut event).await;
//!     assert!(event.default_prevented());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifecycle notifications
//!
//! Consumers subscribe to [`RouterEvent`]s: `router:build` before each
//! discovery pass, `router:initialLoad` when a document first lands in the
//! cache, `router:failLoad` when a fetch fails (navigation degrades to
//! default browser behavior), and `router:change` once a transition's DOM
//! swap is complete. `router:change` is the synchronization point for
//! "the DOM is updated", not the return of [`Router::activate`].
//!
//! ## Error Handling
//!
//! Only the construction boundary is fallible; see [`error`]. Failures on
//! the navigation path are absorbed where they occur and degrade to default
//! navigation, never to an `Err` or a panic in the host page's face.

/// Document cache: single-flight fetch-and-store per URL
pub mod cache;
/// Router construction options and discovery scope
pub mod config;
/// Anchor enumeration and origin classification
pub mod discovery;
/// Arena document model and HTML parsing
pub mod dom;
/// Error types and result aliases
pub mod error;
/// Broadcast notifications around the navigation lifecycle
pub mod events;
/// HTTP fetching behind an injectable trait
pub mod fetcher;
/// Resolved activation handlers and activation events
pub mod handler;
/// Duplicate-suppressing history stack
pub mod history;
/// Body replacement and head diff-merging
pub mod reconcile;
/// Anchor bookkeeping across discovery passes
pub mod registry;
/// The router itself
pub mod router;
/// Script replay after content swaps
pub mod scripts;

// Re-export commonly used types
pub use cache::DocumentCache;
pub use config::{RouterOptions, SearchScope};
pub use discovery::{AnchorCandidate, collect_anchors};
pub use dom::{Attr, Dom, NodeId, StructuralKey, parse_document};
pub use error::{Error, Result};
pub use events::{EventBus, RouterEvent};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use handler::{ActivationEvent, Handler, SETTLE_DELAY, create_handler};
pub use history::{HistoryBridge, NavigationState};
pub use reconcile::{merge_head, replace_body};
pub use registry::AnchorRegistry;
pub use router::Router;
pub use scripts::{
    LoggingRunner, MaterializedScript, PERSIST_ATTR, PERSIST_VALUE, RecordingRunner, ScriptRunner,
    replay_scripts,
};

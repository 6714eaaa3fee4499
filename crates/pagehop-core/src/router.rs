//! The router: discovery policy, transitions, and everything wired together.
//!
//! A [`Router`] owns the live document, the page cache, the anchor
//! registry, and the history stack. Hosts drive it with a small set of
//! calls mirroring browser events: [`Router::hover`] for pointer-enter,
//! [`Router::activate`] for clicks, [`Router::notify_scroll`] when more
//! content may have scrolled into existence. Everything else (prefetching,
//! caching, swapping, history) happens behind those calls.
//!
//! A transition's history write and success log happen before the swap is
//! applied; the [`RouterEvent::Change`] broadcast is the synchronization
//! point for "the DOM is now updated", not the return of `activate`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use crate::cache::DocumentCache;
use crate::config::{RouterOptions, SearchScope};
use crate::discovery::{AnchorCandidate, collect_anchors};
use crate::dom::{Dom, NodeId, parse_document};
use crate::events::{EventBus, RouterEvent};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::handler::{ActivationEvent, Handler, SETTLE_DELAY, create_handler};
use crate::history::{HistoryBridge, NavigationState};
use crate::registry::AnchorRegistry;
use crate::scripts::{LoggingRunner, ScriptRunner, replay_scripts};
use crate::{Error, Result, reconcile};

struct RouterInner {
    options: RouterOptions,
    scope: SearchScope,
    base: Url,
    dom: Mutex<Dom>,
    registry: Mutex<AnchorRegistry>,
    history: Mutex<HistoryBridge>,
    cache: DocumentCache,
    events: EventBus,
    runner: Mutex<Box<dyn ScriptRunner>>,
}

/// Navigation router over a live document.
///
/// Cheap to clone; clones share all state. The clone handed to the
/// settle-delay rescan task is how discovery catches anchors that replayed
/// scripts insert late.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Mount a router over an initial document and run the first discovery
    /// pass.
    ///
    /// `base_url` must be absolute with a host; it anchors relative `href`
    /// resolution and the same-origin check. `scope` restricts discovery to
    /// a subtree (`SearchScope::Document` scans everything). The fetcher and
    /// script runner are injected so tests and embedders can substitute
    /// their own.
    pub async fn mount(
        html: &str,
        base_url: &str,
        options: RouterOptions,
        scope: SearchScope,
        fetcher: Arc<dyn PageFetcher>,
        runner: Box<dyn ScriptRunner>,
    ) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.host_str().is_none() {
            return Err(Error::Mount(format!(
                "base URL \"{base_url}\" has no host to compare origins against"
            )));
        }

        let dom = parse_document(html);
        if let SearchScope::Within(node) = scope {
            if dom.get(node).is_none() {
                return Err(Error::Mount(format!(
                    "search scope {node} does not exist in the document"
                )));
            }
        }

        let events = EventBus::new();
        let cache = DocumentCache::new(fetcher, events.clone(), options.log);
        let router = Self {
            inner: Arc::new(RouterInner {
                options,
                scope,
                base,
                dom: Mutex::new(dom),
                registry: Mutex::new(AnchorRegistry::new()),
                history: Mutex::new(HistoryBridge::new()),
                cache,
                events,
                runner: Mutex::new(runner),
            }),
        };

        router.start().await;
        Ok(router)
    }

    /// Mount with the real HTTP fetcher, a logging script runner, and the
    /// whole document as search scope.
    pub async fn mount_default(html: &str, base_url: &str, options: RouterOptions) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new()?);
        Self::mount(
            html,
            base_url,
            options,
            SearchScope::Document,
            fetcher,
            Box::new(LoggingRunner),
        )
        .await
    }

    /// Subscribe to router notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.inner.events.subscribe()
    }

    /// The document cache. Exposed for consumers that want to seed or
    /// inspect it; entries are immutable once stored either way.
    #[must_use]
    pub fn cache(&self) -> &DocumentCache {
        &self.inner.cache
    }

    /// Read access to the live document.
    pub fn with_dom<T>(&self, f: impl FnOnce(&Dom) -> T) -> T {
        f(&self.dom())
    }

    /// URL of the current history entry, if any navigation happened.
    #[must_use]
    pub fn current_url(&self) -> Option<String> {
        self.history().current().map(|state| state.url.clone())
    }

    /// Snapshot of the history stack, oldest first.
    #[must_use]
    pub fn history_entries(&self) -> Vec<NavigationState> {
        self.history().entries().to_vec()
    }

    /// First anchor in the live document whose `href` attribute equals
    /// `href` verbatim. Convenience for hosts addressing anchors by target.
    #[must_use]
    pub fn find_anchor(&self, href: &str) -> Option<NodeId> {
        let dom = self.dom();
        dom.elements_by_tag(dom.document(), "a")
            .into_iter()
            .find(|&node| dom.attr(node, "href") == Some(href))
    }

    /// Run a discovery pass over the search scope.
    ///
    /// Emits [`RouterEvent::Build`] first (the anchor-injection extension
    /// point), then applies the configured policy to every anchor found.
    /// Safe to re-enter: anchors already listening, excluded, or discovered
    /// are skipped.
    pub async fn start(&self) {
        self.inner.events.emit(RouterEvent::Build);

        let candidates = {
            let dom = self.dom();
            let scope = match self.inner.scope {
                SearchScope::Document => dom.document(),
                SearchScope::Within(node) => node,
            };
            collect_anchors(&dom, scope, &self.inner.base)
        };

        for candidate in candidates {
            if self.inner.options.hover_only {
                // Arm only; no network activity until the host reports a
                // pointer-enter for this anchor.
                self.registry().arm_hover(candidate.node);
            } else {
                if !self.inner.options.preload {
                    continue;
                }
                let newly_discovered = self.registry().discover(candidate.node);
                if newly_discovered {
                    self.handle_anchor(&candidate).await;
                }
            }
        }
    }

    /// Report a pointer-enter on an anchor (hover-gated policy only).
    ///
    /// The first hover marks the anchor discovered and resolves its handler,
    /// fetching the target if needed. Later hovers are no-ops.
    pub async fn hover(&self, anchor: NodeId) {
        if !self.inner.options.hover_only {
            return;
        }
        self.registry().discover(anchor);

        let candidate = {
            let dom = self.dom();
            let Some(href) = dom.attr(anchor, "href") else {
                return;
            };
            let Ok(url) = self.inner.base.join(href) else {
                return;
            };
            let cross_origin = url.host_str() != self.inner.base.host_str();
            AnchorCandidate {
                node: anchor,
                url,
                cross_origin,
            }
        };
        self.handle_anchor(&candidate).await;
    }

    /// Report a scroll in the search scope. Cheap heuristic for "more
    /// content, possibly more anchors, has appeared"; just re-runs
    /// discovery.
    pub async fn notify_scroll(&self) {
        self.start().await;
    }

    /// Deliver an activation (click) on an anchor.
    ///
    /// With a resolved transition handler, default behavior is suppressed
    /// and the cached document is swapped in. With no handler (never
    /// discovered, prefetch failed, or cross-origin) the event is left
    /// untouched and the host performs default navigation.
    pub async fn activate(&self, anchor: NodeId, event: &mut ActivationEvent) {
        let handler = self.registry().handler(anchor);
        let Some(Handler::Transition { url }) = handler else {
            return;
        };

        event.prevent_default();

        let Some(text) = self.inner.cache.peek(&url) else {
            // Guarded defensively; a resolved handler should imply an entry.
            warn!("FAIL \"{}\" is not in the pages cache", url);
            return;
        };
        if self.inner.options.log {
            info!("CACHE hit for \"{}\"", url);
        }

        // History and the success log land before the swap is applied; the
        // Change broadcast below is what signals "DOM updated".
        self.history().change_state(&url);
        if self.inner.options.log {
            info!("SUCCESS loaded \"{}\" into the page", url);
        }

        let target = parse_document(&text);
        {
            let mut dom = self.dom();
            reconcile::replace_body(&mut dom, &target);
            reconcile::merge_head(&mut dom, &target);
            // Document-wide, so scripts the head merge appended run too.
            let root = dom.document();
            let mut runner = self.runner();
            replay_scripts(&mut dom, root, runner.as_mut());
        }
        self.inner.events.emit(RouterEvent::Change { url });

        // Catch anchors the swapped content rendered directly, then once
        // more after the settle delay for anchors inserted by replayed
        // scripts.
        self.start().await;
        let rescan = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SETTLE_DELAY).await;
            rescan.start().await;
        });
    }

    async fn handle_anchor(&self, candidate: &AnchorCandidate) {
        if candidate.cross_origin {
            let newly_excluded = self.registry().exclude(candidate.node);
            if newly_excluded {
                if self.inner.options.log {
                    info!("LINK {} opens in a new context", candidate.url);
                }
                self.dom().set_attr(candidate.node, "target", "_blank");
            }
            return;
        }

        // Reserve the listening slot before awaiting the cache so a
        // re-entrant discovery pass cannot start a second resolution.
        let reserved = self.registry().begin_listening(candidate.node);
        if !reserved {
            return;
        }
        if self.inner.options.log {
            info!("LINK {}", candidate.url);
        }

        let handler = create_handler(&self.inner.cache, candidate.url.as_str()).await;
        self.registry().install(candidate.node, handler);
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.inner.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry(&self) -> MutexGuard<'_, AnchorRegistry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn history(&self) -> MutexGuard<'_, HistoryBridge> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn runner(&self) -> MutexGuard<'_, Box<dyn ScriptRunner>> {
        self.inner
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use async_trait::async_trait;

    use super::*;
    use crate::fetcher::FetchedPage;

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                status: 200,
                body: format!("<html><head></head><body><h1>{url}</h1></body></html>"),
            })
        }
    }

    async fn mounted(html: &str, options: RouterOptions) -> Router {
        Router::mount(
            html,
            "https://mysite.com/",
            options,
            SearchScope::Document,
            Arc::new(StaticFetcher),
            Box::new(LoggingRunner),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn mount_rejects_hostless_base() {
        let result = Router::mount(
            "<body></body>",
            "data:text/html,x",
            RouterOptions::default(),
            SearchScope::Document,
            Arc::new(StaticFetcher),
            Box::new(LoggingRunner),
        )
        .await;
        assert!(matches!(result, Err(Error::Mount(_))));
    }

    #[tokio::test]
    async fn mount_rejects_unknown_scope_node() {
        let result = Router::mount(
            "<body></body>",
            "https://mysite.com/",
            RouterOptions::default(),
            SearchScope::Within(NodeId(9999)),
            Arc::new(StaticFetcher),
            Box::new(LoggingRunner),
        )
        .await;
        assert!(matches!(result, Err(Error::Mount(_))));
    }

    #[tokio::test]
    async fn eager_mount_prefetches_same_origin_anchors() {
        let router = mounted(
            r#"<body><a href="/about">About</a></body>"#,
            RouterOptions::default(),
        )
        .await;
        assert!(router.cache().contains("https://mysite.com/about"));
    }

    #[tokio::test]
    async fn preload_disabled_leaves_anchors_alone() {
        let router = mounted(
            r#"<body><a href="/about">About</a></body>"#,
            RouterOptions {
                preload: false,
                ..RouterOptions::default()
            },
        )
        .await;
        assert!(!router.cache().contains("https://mysite.com/about"));

        let anchor = router.find_anchor("/about").unwrap();
        let mut event = ActivationEvent::new();
        router.activate(anchor, &mut event).await;
        assert!(!event.default_prevented(), "default navigation applies");
    }

    #[tokio::test]
    async fn hover_gated_mount_fetches_nothing_until_hover() {
        let router = mounted(
            r#"<body><a href="/about">About</a></body>"#,
            RouterOptions {
                hover_only: true,
                ..RouterOptions::default()
            },
        )
        .await;
        assert!(!router.cache().contains("https://mysite.com/about"));

        let anchor = router.find_anchor("/about").unwrap();
        router.hover(anchor).await;
        assert!(router.cache().contains("https://mysite.com/about"));

        // Second hover resolves nothing new.
        router.hover(anchor).await;
    }

    #[tokio::test]
    async fn scroll_rescan_attaches_no_duplicate_listeners() {
        let router = mounted(
            r#"<body><a href="/about">About</a></body>"#,
            RouterOptions::default(),
        )
        .await;
        router.notify_scroll().await;
        router.notify_scroll().await;
        assert_eq!(router.registry().listening_count(), 1);
    }
}

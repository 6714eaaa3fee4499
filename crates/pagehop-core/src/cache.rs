//! Document cache keyed by absolute URL.
//!
//! The cache is the single owner of fetched page text. Entries are immutable
//! for the process lifetime: once a page is stored it is never invalidated,
//! refetched, or expired. A URL is recorded in the slot map at the moment its
//! fetch future is created, before anything is awaited, which is what makes
//! the single-flight guarantee hold under concurrent callers.
//!
//! Failure is soft by contract. A fetch that errors or comes back with a
//! non-success status stores nothing, broadcasts
//! [`RouterEvent::FailLoad`], and resolves every waiter with `None` — the
//! "no handler installed" sentinel. Callers treat `None` as "navigation
//! falls through to default browser behavior"; nothing on this path ever
//! returns `Err`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::events::{EventBus, RouterEvent};
use crate::fetcher::PageFetcher;

type PageFuture = Shared<BoxFuture<'static, Option<Arc<str>>>>;

enum Slot {
    /// Fetch in flight; every concurrent caller awaits the same future.
    Pending(PageFuture),
    /// Stored page text, immutable from here on.
    Ready(Arc<str>),
}

struct CacheInner {
    slots: Mutex<HashMap<String, Slot>>,
    fetcher: Arc<dyn PageFetcher>,
    events: EventBus,
    log: bool,
}

impl CacheInner {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-lifetime cache of fetched page documents, single-flight per URL.
#[derive(Clone)]
pub struct DocumentCache {
    inner: Arc<CacheInner>,
}

impl DocumentCache {
    /// Create a cache over the given fetcher and event bus.
    ///
    /// `log` gates the chatty per-URL hit/fetch lines; structural debug
    /// logging is always on.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, events: EventBus, log: bool) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                slots: Mutex::new(HashMap::new()),
                fetcher,
                events,
                log,
            }),
        }
    }

    /// Resolve the document text for `url`.
    ///
    /// Hits resolve immediately. Misses issue exactly one network fetch no
    /// matter how many callers arrive while it is in flight. `None` means
    /// the fetch failed and the caller should leave default navigation in
    /// place.
    pub async fn get(&self, url: &str) -> Option<Arc<str>> {
        let pending = {
            let mut slots = self.inner.slots();
            match slots.get(url) {
                Some(Slot::Ready(text)) => {
                    if self.inner.log {
                        info!("CACHE hit for \"{}\"", url);
                    }
                    return Some(Arc::clone(text));
                }
                Some(Slot::Pending(fut)) => fut.clone(),
                None => {
                    let fut = Self::fetch_into(Arc::clone(&self.inner), url.to_string());
                    slots.insert(url.to_string(), Slot::Pending(fut.clone()));
                    fut
                }
            }
        };
        pending.await
    }

    /// Whether a document for `url` is stored (pending fetches count as
    /// absent).
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        matches!(self.inner.slots().get(url), Some(Slot::Ready(_)))
    }

    /// Stored document text for `url`, if present. Never triggers a fetch.
    #[must_use]
    pub fn peek(&self, url: &str) -> Option<Arc<str>> {
        match self.inner.slots().get(url) {
            Some(Slot::Ready(text)) => Some(Arc::clone(text)),
            _ => None,
        }
    }

    fn fetch_into(inner: Arc<CacheInner>, url: String) -> PageFuture {
        async move {
            match inner.fetcher.fetch(&url).await {
                Ok(page) if page.is_success() => {
                    let text: Arc<str> = Arc::from(page.body);
                    inner
                        .slots()
                        .insert(url.clone(), Slot::Ready(Arc::clone(&text)));
                    if inner.log {
                        info!("HTTP fetched \"{}\" into the page cache", url);
                    }
                    inner.events.emit(RouterEvent::InitialLoad { url });
                    Some(text)
                }
                Ok(page) => {
                    inner.slots().remove(&url);
                    if inner.log {
                        warn!("FAIL could not load \"{}\" (status {})", url, page.status);
                    }
                    inner.events.emit(RouterEvent::FailLoad { url });
                    None
                }
                Err(err) => {
                    inner.slots().remove(&url);
                    debug!("fetch error for \"{}\": {}", url, err);
                    if inner.log {
                        warn!("FAIL could not load \"{}\"", url);
                    }
                    inner.events.emit(RouterEvent::FailLoad { url });
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::fetcher::FetchedPage;

    struct CountingFetcher {
        calls: AtomicUsize,
        status: u16,
    }

    impl CountingFetcher {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status: 200,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status: 500,
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> crate::Result<FetchedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent callers genuinely overlap the fetch.
            tokio::task::yield_now().await;
            Ok(FetchedPage {
                status: self.status,
                body: format!("<html><body>{url}</body></html>"),
            })
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let fetcher = CountingFetcher::ok();
        let cache = DocumentCache::new(fetcher.clone(), EventBus::new(), false);

        let (a, b) = tokio::join!(cache.get("/about"), cache.get("/about"));
        assert!(a.is_some());
        assert_eq!(a.as_deref(), b.as_deref());
        assert_eq!(fetcher.count(), 1, "single-flight per URL");
    }

    #[tokio::test]
    async fn second_get_is_a_hit() {
        let fetcher = CountingFetcher::ok();
        let cache = DocumentCache::new(fetcher.clone(), EventBus::new(), true);

        let first = cache.get("/about").await.unwrap();
        let second = cache.get("/about").await.unwrap();
        assert_eq!(&*first, &*second);
        assert_eq!(fetcher.count(), 1);
        assert!(cache.contains("/about"));
    }

    #[tokio::test]
    async fn failure_stores_nothing_and_broadcasts() {
        let fetcher = CountingFetcher::failing();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let cache = DocumentCache::new(fetcher.clone(), bus, false);

        assert!(cache.get("/missing").await.is_none());
        assert!(!cache.contains("/missing"));
        assert_eq!(
            rx.recv().await.unwrap(),
            RouterEvent::FailLoad {
                url: "/missing".into()
            }
        );

        // Not stored, so a later pass may retry.
        assert!(cache.get("/missing").await.is_none());
        assert_eq!(fetcher.count(), 2);
    }

    #[tokio::test]
    async fn success_broadcasts_initial_load() {
        let fetcher = CountingFetcher::ok();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let cache = DocumentCache::new(fetcher, bus, false);

        cache.get("/home").await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            RouterEvent::InitialLoad {
                url: "/home".into()
            }
        );
    }
}

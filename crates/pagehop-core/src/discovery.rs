//! Anchor enumeration and classification for discovery passes.
//!
//! A discovery pass scans the configured search scope for anchors and sorts
//! them into same-origin candidates (eligible for interception) and
//! cross-origin ones (marked to open in a new context, never intercepted).
//! The policy side of discovery (eager vs hover-gated, registry
//! bookkeeping) lives on the router; this module is the pure scan.

use tracing::debug;
use url::Url;

use crate::dom::{Dom, NodeId};

/// An anchor found by a discovery scan, with its resolved target.
#[derive(Debug, Clone)]
pub struct AnchorCandidate {
    /// The anchor element.
    pub node: NodeId,
    /// The anchor's `href` resolved against the page's base URL.
    pub url: Url,
    /// Whether the target's host differs from the page's host. A target
    /// with no host at all (`mailto:`, `data:`) counts as cross-origin,
    /// matching how a browser's location comparison behaves.
    pub cross_origin: bool,
}

/// Enumerate the anchors under `scope` and resolve their targets.
///
/// Anchors without an `href`, or whose `href` does not resolve against
/// `base`, are skipped with a debug log; they are not interception
/// candidates and not errors.
#[must_use]
pub fn collect_anchors(dom: &Dom, scope: NodeId, base: &Url) -> Vec<AnchorCandidate> {
    let mut candidates = Vec::new();
    for node in dom.elements_by_tag(scope, "a") {
        let Some(href) = dom.attr(node, "href") else {
            debug!("anchor {} has no href, skipping", node);
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url,
            Err(err) => {
                debug!("anchor {} href \"{}\" did not resolve: {}", node, href, err);
                continue;
            }
        };
        let cross_origin = url.host_str() != base.host_str();
        candidates.push(AnchorCandidate {
            node,
            url,
            cross_origin,
        });
    }
    candidates
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::dom::parse_document;

    fn base() -> Url {
        Url::parse("https://mysite.com/index.html").unwrap()
    }

    #[test]
    fn relative_hrefs_resolve_against_base() {
        let dom = parse_document(r#"<body><a href="/about">About</a></body>"#);
        let found = collect_anchors(&dom, dom.document(), &base());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url.as_str(), "https://mysite.com/about");
        assert!(!found[0].cross_origin);
    }

    #[test]
    fn external_hosts_are_cross_origin() {
        let dom = parse_document(r#"<body><a href="https://external.example/x">ext</a></body>"#);
        let found = collect_anchors(&dom, dom.document(), &base());
        assert_eq!(found.len(), 1);
        assert!(found[0].cross_origin);
    }

    #[test]
    fn hostless_schemes_count_as_cross_origin() {
        let dom = parse_document(r#"<body><a href="mailto:hi@mysite.com">mail</a></body>"#);
        let found = collect_anchors(&dom, dom.document(), &base());
        assert_eq!(found.len(), 1);
        assert!(found[0].cross_origin);
    }

    #[test]
    fn hrefless_anchors_are_skipped() {
        let dom = parse_document(r#"<body><a name="top">anchor</a><a href="/x">x</a></body>"#);
        let found = collect_anchors(&dom, dom.document(), &base());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url.path(), "/x");
    }

    #[test]
    fn scope_limits_the_scan() {
        let dom = parse_document(
            r#"<body><nav><a href="/in">in</a></nav><footer><a href="/out">out</a></footer></body>"#,
        );
        let nav = dom.find_by_tag(dom.document(), "nav").unwrap();
        let found = collect_anchors(&dom, nav, &base());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url.path(), "/in");
    }
}

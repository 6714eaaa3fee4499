//! DOM reconciliation: body replacement and head diff-merging.
//!
//! The body subtree is disposable per navigation, so body reconciliation is
//! a full content replacement. The head is different: elements common to
//! both documents (stylesheet links above all) must survive in place to
//! avoid a flash of unstyled content, while page-specific elements (title,
//! meta) swap. "Common" is decided by structural equality over
//! [`StructuralKey`]s, never by node identity, so the merge is portable and
//! testable against plain arenas.

use std::collections::HashSet;

use tracing::debug;

use crate::dom::{Dom, NodeId, StructuralKey};

/// Replace the live body's content with the target document's body content.
///
/// A missing body on either side (possible for degenerate markup) makes
/// this a logged no-op; nothing is partially applied.
pub fn replace_body(live: &mut Dom, target: &Dom) {
    let (Some(live_body), Some(target_body)) = (live.body(), target.body()) else {
        debug!("body replacement skipped: document has no body");
        return;
    };

    live.clear_children(live_body);
    let incoming: Vec<NodeId> = target.children(target_body).collect();
    for child in incoming {
        if let Some(copied) = live.import(target, child) {
            live.append(live_body, copied);
        }
    }
}

/// Diff-merge the target document's head into the live head.
///
/// Live head elements not structurally present in the target are removed;
/// target head elements not structurally present live are appended; the
/// intersection is left untouched (same nodes, same positions). Text and
/// comment children are not part of the diff. Idempotent: merging the same
/// target twice leaves the element set unchanged after the first pass.
pub fn merge_head(live: &mut Dom, target: &Dom) {
    let (Some(live_head), Some(target_head)) = (live.head(), target.head()) else {
        debug!("head merge skipped: document has no head");
        return;
    };

    let target_keys: HashSet<StructuralKey> = target
        .children(target_head)
        .filter_map(|child| target.structural_key(child))
        .collect();

    let live_children: Vec<NodeId> = live.children(live_head).collect();
    let mut kept_keys: HashSet<StructuralKey> = HashSet::new();
    for child in live_children {
        if let Some(key) = live.structural_key(child) {
            if target_keys.contains(&key) {
                kept_keys.insert(key);
            } else {
                live.detach(child);
            }
        }
    }

    let incoming: Vec<NodeId> = target.children(target_head).collect();
    for child in incoming {
        let Some(key) = target.structural_key(child) else {
            continue;
        };
        if kept_keys.contains(&key) {
            continue;
        }
        if let Some(copied) = live.import(target, child) {
            live.append(live_head, copied);
            kept_keys.insert(key);
        }
    }
}

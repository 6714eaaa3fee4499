//! Owned document model.
//!
//! The router never touches a host DOM directly; fetched pages are parsed
//! into an arena tree and the live page is the same structure. All
//! reconciliation (body replace, head merge, script rewriting) is tree
//! surgery on these arenas, which keeps every transition observable in
//! tests without a browser.

mod arena;
mod tree_sink;

pub use arena::{Attr, Dom, Node, NodeData, NodeId, StructuralKey};
pub use tree_sink::{DomSink, NodeHandle, parse_document};

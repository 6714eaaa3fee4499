//! Arena-based document model.
//!
//! Fetched page text is parsed into this arena, and the live page the router
//! owns is one of these as well. Nodes are stored in a contiguous vector and
//! linked by index, which keeps traversal cheap and lets the reconciler move
//! content between documents with plain deep copies. Detached nodes stay
//! allocated for the lifetime of the arena; nothing here is ever freed early,
//! matching the process-lifetime model of the rest of the crate.

use std::fmt;

use html5ever::QualName;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "#none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// HTML attribute, with the name lowered to its local part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attr {
    /// Local attribute name (`href`, `state`, ...).
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with qualified name and attributes.
    Element {
        /// Qualified tag name as produced by the parser.
        name: QualName,
        /// Attributes in document order.
        attrs: Vec<Attr>,
    },
    /// Text content.
    Text(String),
    /// Comment (kept so reserialization-adjacent logic stays faithful).
    Comment(String),
    /// Document type declaration.
    Doctype {
        /// Doctype name (`html`).
        name: String,
    },
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    /// Payload.
    pub data: NodeData,
    /// Parent link, `NodeId::NONE` when detached.
    pub parent: NodeId,
    /// First child link.
    pub first_child: NodeId,
    /// Last child link.
    pub last_child: NodeId,
    /// Previous sibling link.
    pub prev_sibling: NodeId,
    /// Next sibling link.
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Structural identity of an element, used for head diff-merging.
///
/// Two elements are "the same" when tag, attribute set, and contained text
/// agree. This is deliberate value equality rather than node identity so the
/// merge behaves the same against any host and is testable without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralKey {
    tag: String,
    attrs: Vec<Attr>,
    text: String,
}

/// Arena document tree.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a new empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        // The sentinel index is reserved; an arena that large aborts
        // instead of handing out a duplicate id.
        let index = u32::try_from(self.nodes.len()).unwrap_or(NodeId::NONE.0);
        assert!(index < NodeId::NONE.0, "node arena exhausted");
        self.nodes.push(node);
        NodeId(index)
    }

    /// The document root.
    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Number of nodes ever allocated, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds only the document root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Get a node by ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attr>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);

        let last = self.get(parent).map_or(NodeId::NONE, |p| p.last_child);
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = last;
        }
        if last.is_some() {
            if let Some(prev) = self.get_mut(last) {
                prev.next_sibling = child;
            }
        }
        if let Some(p) = self.get_mut(parent) {
            if p.first_child.is_none() {
                p.first_child = child;
            }
            p.last_child = child;
        }
    }

    /// Append text to `parent`, merging into a trailing text node if present.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.get(parent).map_or(NodeId::NONE, |p| p.last_child);
        if let Some(Node {
            data: NodeData::Text(existing),
            ..
        }) = self.get_mut(last)
        {
            existing.push_str(text);
            return;
        }
        let id = self.create_text(text.to_string());
        self.append(parent, id);
    }

    /// Insert `node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        self.detach(node);

        let (parent, prev) = match self.get(sibling) {
            Some(s) => (s.parent, s.prev_sibling),
            None => return,
        };

        if let Some(n) = self.get_mut(node) {
            n.parent = parent;
            n.prev_sibling = prev;
            n.next_sibling = sibling;
        }
        if let Some(s) = self.get_mut(sibling) {
            s.prev_sibling = node;
        }
        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = node;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = node;
        }
    }

    /// Unlink a node from its parent and siblings. The node (and its own
    /// subtree) stays allocated and can be re-attached.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        if parent.is_none() && prev.is_none() && next.is_none() {
            return;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Detach every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        while let Some(child) = self.get(parent).map(|p| p.first_child) {
            if child.is_none() {
                break;
            }
            self.detach(child);
        }
    }

    /// Replace `old` with `new` at the same position in the tree.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Iterate over the direct children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.get(id).map_or(NodeId::NONE, |n| n.first_child);
        std::iter::successors(
            if first.is_some() { Some(first) } else { None },
            move |&cur| {
                let next = self.get(cur).map_or(NodeId::NONE, |n| n.next_sibling);
                if next.is_some() { Some(next) } else { None }
            },
        )
    }

    /// Iterate over all descendants of `scope` in document order, excluding
    /// `scope` itself. The scope may be the document root or any element,
    /// which is how an element-or-document search scope is expressed.
    #[must_use]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut kids: Vec<NodeId> = self.children(id).collect();
            kids.reverse();
            stack.append(&mut kids);
        }
        out
    }

    /// Local tag name of an element node.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => Some(name.local.as_ref()),
            _ => None,
        }
    }

    /// All descendant elements of `scope` with the given tag, document order.
    #[must_use]
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some(tag))
            .collect()
    }

    /// First descendant element with the given tag.
    #[must_use]
    pub fn find_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(tag))
    }

    /// The document's `<head>` element, if the parse produced one.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.find_by_tag(self.document, "head")
    }

    /// The document's `<body>` element, if the parse produced one.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag(self.document, "body")
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// All attributes of an element, document order.
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Set (or overwrite) an attribute on an element. No-op for non-elements.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.get_mut(id).map(|n| &mut n.data) {
            if let Some(attr) = attrs.iter_mut().find(|a| a.name == name) {
                attr.value = value.to_string();
            } else {
                attrs.push(Attr {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    /// Concatenated text of a node's subtree (the node's own text for text
    /// nodes, descendant text for elements).
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(_) => {
                for child in self.descendants(id) {
                    if let Some(NodeData::Text(text)) = self.get(child).map(|n| &n.data) {
                        out.push_str(text);
                    }
                }
            }
            None => {}
        }
        out
    }

    /// Structural identity of an element: tag, sorted attributes, text.
    #[must_use]
    pub fn structural_key(&self, id: NodeId) -> Option<StructuralKey> {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { name, attrs, .. }) => {
                let mut sorted = attrs.clone();
                sorted.sort();
                Some(StructuralKey {
                    tag: name.local.as_ref().to_string(),
                    attrs: sorted,
                    text: self.text_content(id),
                })
            }
            _ => None,
        }
    }

    /// Deep-copy a subtree from another arena into this one, returning the
    /// local ID of the copy's root. The copy starts detached.
    pub fn import(&mut self, src: &Dom, src_id: NodeId) -> Option<NodeId> {
        let data = match src.get(src_id).map(|n| &n.data) {
            Some(data) => data.clone(),
            None => return None,
        };
        let local = self.alloc(Node::new(data));
        let children: Vec<NodeId> = src.children(src_id).collect();
        for child in children {
            if let Some(copied) = self.import(src, child) {
                self.append(local, copied);
            }
        }
        Some(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    #[test]
    fn allocated_ids_are_distinct_and_below_the_sentinel() {
        let mut dom = Dom::new();
        let mut seen = std::collections::HashSet::new();
        seen.insert(dom.document());
        for i in 0..64 {
            let id = dom.create_text(format!("t{i}"));
            assert!(id.is_some());
            assert!(seen.insert(id), "id {id} was handed out twice");
        }
    }

    #[test]
    fn append_and_children_order() {
        let mut dom = Dom::new();
        let name = html5ever::QualName::new(None, html5ever::ns!(html), "div".into());
        let root = dom.create_element(name, Vec::new());
        dom.append(dom.document(), root);
        let a = dom.create_text("a".into());
        let b = dom.create_text("b".into());
        dom.append(root, a);
        dom.append(root, b);
        let kids: Vec<NodeId> = dom.children(root).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(dom.text_content(root), "ab");
    }

    #[test]
    fn detach_relinks_siblings() {
        let dom_src = parse_document("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let mut dom = Dom::new();
        let list = dom
            .import(&dom_src, dom_src.find_by_tag(dom_src.document(), "ul").unwrap())
            .unwrap();
        dom.append(dom.document(), list);

        let items = dom.elements_by_tag(list, "li");
        assert_eq!(items.len(), 3);
        dom.detach(items[1]);
        let remaining = dom.elements_by_tag(list, "li");
        assert_eq!(remaining, vec![items[0], items[2]]);
        assert_eq!(dom.text_content(list), "13");
    }

    #[test]
    fn replace_node_keeps_position() {
        let src = parse_document("<p><b>x</b><i>y</i><u>z</u></p>");
        let mut dom = Dom::new();
        let p = dom
            .import(&src, src.find_by_tag(src.document(), "p").unwrap())
            .unwrap();
        dom.append(dom.document(), p);

        let old = dom.find_by_tag(p, "i").unwrap();
        let fresh = dom.create_text("Y".into());
        dom.replace_node(old, fresh);
        assert_eq!(dom.text_content(p), "xYz");
    }

    #[test]
    fn structural_keys_ignore_attribute_order() {
        let a = parse_document(r#"<meta name="x" content="1">"#);
        let b = parse_document(r#"<meta content="1" name="x">"#);
        let ka = a.structural_key(a.find_by_tag(a.document(), "meta").unwrap());
        let kb = b.structural_key(b.find_by_tag(b.document(), "meta").unwrap());
        assert_eq!(ka, kb);
    }

    #[test]
    fn set_attr_overwrites_and_inserts() {
        let mut dom = parse_document(r#"<a href="/x">link</a>"#);
        let anchor = dom.find_by_tag(dom.document(), "a").unwrap();
        dom.set_attr(anchor, "target", "_blank");
        dom.set_attr(anchor, "href", "/y");
        assert_eq!(dom.attr(anchor, "target"), Some("_blank"));
        assert_eq!(dom.attr(anchor, "href"), Some("/y"));
        assert_eq!(dom.attrs(anchor).len(), 2);
    }
}

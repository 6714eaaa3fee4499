#![allow(unsafe_code)] // elem_name lifetime workaround, see SAFETY note below
#![deny(unsafe_op_in_unsafe_fn)]
//! html5ever `TreeSink` implementation feeding the arena document model.
//!
//! Parsing is lenient: parse errors are swallowed the way a browser would,
//! and whatever tree html5ever recovers is what the router works with.

use std::cell::RefCell;

use html5ever::driver::ParseOpts;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName, parse_document as html5_parse};

use super::arena::{Attr, Dom, NodeData, NodeId};

/// Parse raw HTML text into an arena document.
///
/// Never fails; malformed input produces whatever tree the HTML5 recovery
/// algorithm yields, which is exactly the behavior the host environment
/// would have.
#[must_use]
pub fn parse_document(html: &str) -> Dom {
    let sink = DomSink::new();
    html5_parse(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Handle used by the sink to reference arena nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub NodeId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(NodeId::NONE)
    }
}

/// `TreeSink` that builds a [`Dom`].
///
/// Interior mutability (`RefCell`) because the trait takes `&self` while the
/// arena needs mutation.
pub struct DomSink {
    dom: RefCell<Dom>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    /// Consume the sink and return the built document.
    #[must_use]
    pub fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }
}

fn convert_attrs(attrs: Vec<Html5Attribute>) -> Vec<Attr> {
    attrs
        .into_iter()
        .map(|a| Attr {
            name: a.name.local.as_ref().to_string(),
            value: a.value.to_string(),
        })
        .collect()
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Lenient like a browser: recovered trees are accepted as-is.
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.dom.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match dom.get(target.0).map(|n| &n.data) {
            Some(NodeData::Element { name, .. }) => {
                // SAFETY: the QualName lives in the arena, which lives as
                // long as `self`; the arena is append-only during parsing so
                // the referent is never moved or dropped while borrowed. The
                // borrow checker cannot see this through the RefCell, so the
                // lifetime is extended manually.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = convert_attrs(attrs);
        NodeHandle(self.dom.borrow_mut().create_element(name, attrs))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        NodeHandle(self.dom.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions carry nothing we act on; keep a placeholder.
        NodeHandle(self.dom.borrow_mut().create_comment(String::new()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent.0, node.0),
            NodeOrText::AppendText(text) => dom.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().get(element.0).map(|n| n.parent);
        if let Some(parent) = parent
            && parent.is_some()
        {
            let mut dom = self.dom.borrow_mut();
            match child {
                NodeOrText::AppendNode(node) => dom.append(parent, node.0),
                NodeOrText::AppendText(text) => dom.append_text(parent, &text),
            }
            return;
        }
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doc = dom.document();
        let doctype = dom.create_doctype(name.to_string());
        dom.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents are not tracked separately; the subtree is enough
        // for discovery and reconciliation.
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let text_node = dom.create_text(text.to_string());
                dom.insert_before(sibling.0, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(node) = dom.get_mut(target.0)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in convert_attrs(attrs) {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<NodeId> = self.dom.borrow().children(node.0).collect();
        let mut dom = self.dom.borrow_mut();
        for child in children {
            dom.append(new_parent.0, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_page() {
        let dom = parse_document(
            "<!doctype html><html><head><title>Home</title></head>\
             <body><a href=\"/about\">About</a></body></html>",
        );
        let head = dom.head().expect("head");
        let body = dom.body().expect("body");
        assert_eq!(
            dom.text_content(dom.find_by_tag(head, "title").expect("title")),
            "Home"
        );
        let anchors = dom.elements_by_tag(body, "a");
        assert_eq!(anchors.len(), 1);
        assert_eq!(dom.attr(anchors[0], "href"), Some("/about"));
    }

    #[test]
    fn fragment_input_still_gets_head_and_body() {
        // html5ever synthesizes the document scaffolding around fragments.
        let dom = parse_document("<p>hello</p>");
        assert!(dom.head().is_some());
        let body = dom.body().expect("body");
        assert_eq!(dom.text_content(body), "hello");
    }

    #[test]
    fn malformed_markup_is_recovered_not_rejected() {
        let dom = parse_document("<div><a href='/x'>unclosed");
        let anchors = dom.elements_by_tag(dom.document(), "a");
        assert_eq!(anchors.len(), 1);
        assert_eq!(dom.text_content(anchors[0]), "unclosed");
    }

    #[test]
    fn script_text_is_preserved_verbatim() {
        let dom = parse_document("<body><script>let x = 1 < 2;</script></body>");
        let script = dom.find_by_tag(dom.document(), "script").expect("script");
        assert_eq!(dom.text_content(script), "let x = 1 < 2;");
    }
}

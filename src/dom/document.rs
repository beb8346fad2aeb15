//! Document - Arena-backed node store shared by every mounted component.
//!
//! Nodes are slots in an arena addressed by [`NodeId`]. Ids are handed out
//! monotonically and never reused, so a stale id simply stops resolving once
//! its node is released.
//!
//! Every method takes `&self` and holds the inner borrow only for the
//! duration of the call. Event listeners run with no borrow held, so a
//! handler may mutate component state and trigger a re-render.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use super::event::{Event, EventHandler, Listener};
use super::selector::Selector;
use crate::error::{Result, WorkframeError};

// =============================================================================
// Node Types
// =============================================================================

/// Address of a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Kind of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
}

#[derive(Debug)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct DomNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

fn missing(id: NodeId) -> WorkframeError {
    WorkframeError::Document(format!("node {} does not exist", id.0))
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<Option<DomNode>>,
}

impl Arena {
    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(DomNode::new(data)));
        id
    }

    fn get(&self, id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| missing(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(id))
    }

    /// Unlink `id` from its parent, if it has one.
    fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(());
        };
        if let Ok(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&child| child != id);
        }
        self.get_mut(id)?.parent = None;
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).ok().and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).ok().and_then(|n| n.parent);
        }
        false
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Document => {
                for &child in &node.children {
                    self.write_html(child, out);
                }
            }
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
        }
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            _ => {
                for &child in &node.children {
                    self.write_text(child, out);
                }
            }
        }
    }

    /// Pre-order walk below (and including) `id`.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Ok(node) = self.get(next) else { continue };
            order.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// Document Handle
// =============================================================================

/// Shared handle to an in-memory document. Clones refer to the same document.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Rc<RefCell<Arena>>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing an empty `body` element.
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let root = arena.push(NodeData::Document);
        let body = arena.push(NodeData::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        if let Some(node) = arena.nodes[body.0].as_mut() {
            node.parent = Some(root);
        }
        if let Some(node) = arena.nodes[root.0].as_mut() {
            node.children.push(body);
        }

        Self {
            inner: Rc::new(RefCell::new(arena)),
            root,
            body,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// True when both handles refer to the same document.
    pub fn same_document(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().push(NodeData::Element {
            tag: tag.to_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner.borrow_mut().push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.inner.borrow_mut().push(NodeData::Comment(text.to_string()))
    }

    /// Free a node and its whole subtree, unlinking it from its parent first.
    /// The document root cannot be released.
    pub fn release(&self, id: NodeId) {
        if id == self.root {
            return;
        }
        let mut arena = self.inner.borrow_mut();
        if arena.detach(id).is_err() {
            return;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = arena.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn exists(&self, id: NodeId) -> bool {
        self.inner.borrow().get(id).is_ok()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        let arena = self.inner.borrow();
        let node = arena.get(id).ok()?;
        Some(match node.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        match &self.inner.borrow().get(id).ok()?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().get(id).ok()?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().get(id).ok()?.children.first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let arena = self.inner.borrow();
        let parent = arena.get(id).ok()?.parent?;
        let siblings = &arena.get(parent).ok()?.children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// True when the node is attached (transitively) to the document root.
    pub fn contains(&self, id: NodeId) -> bool {
        let arena = self.inner.borrow();
        id == self.root || (arena.get(id).is_ok() && arena.is_ancestor(self.root, id))
    }

    /// Number of live nodes, including the root and body.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Concatenated text of all text descendants. Comments are skipped.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().write_text(id, &mut out);
        out
    }

    /// Deterministic HTML serialization of a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.inner.borrow().write_html(id, &mut out);
        out
    }

    // -------------------------------------------------------------------------
    // Tree Mutation
    // -------------------------------------------------------------------------

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`).
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let mut arena = self.inner.borrow_mut();
        arena.get(child)?;

        match arena.get(parent)?.data {
            NodeData::Element { .. } | NodeData::Document => {}
            _ => {
                return Err(WorkframeError::Document(format!(
                    "node {} cannot have children",
                    parent.0
                )))
            }
        }
        if child == parent || arena.is_ancestor(child, parent) {
            return Err(WorkframeError::Document(format!(
                "inserting node {} into node {} would create a cycle",
                child.0, parent.0
            )));
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if arena.get(reference)?.parent != Some(parent) {
                return Err(WorkframeError::Document(format!(
                    "node {} is not a child of node {}",
                    reference.0, parent.0
                )));
            }
        }

        arena.detach(child)?;

        let siblings = &mut arena.get_mut(parent)?.children;
        let index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|&c| c == reference)
                .ok_or_else(|| missing(reference))?,
            None => siblings.len(),
        };
        siblings.insert(index, child);
        arena.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink `child` from `parent`. The child stays alive until released.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut arena = self.inner.borrow_mut();
        if arena.get(child)?.parent != Some(parent) {
            return Err(WorkframeError::Document(format!(
                "node {} is not a child of node {}",
                child.0, parent.0
            )));
        }
        arena.detach(child)
    }

    /// Put `new` where `old` is, unlinking `old`.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> Result<()> {
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    // -------------------------------------------------------------------------
    // Attributes & Text
    // -------------------------------------------------------------------------

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let mut arena = self.inner.borrow_mut();
        match &mut arena.get_mut(id)?.data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(key, _)| key == name) {
                    Some((_, existing)) => *existing = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(WorkframeError::Document(format!(
                "node {} is not an element",
                id.0
            ))),
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<()> {
        let mut arena = self.inner.borrow_mut();
        if let NodeData::Element { attributes, .. } = &mut arena.get_mut(id)?.data {
            attributes.retain(|(key, _)| key != name);
        }
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.inner.borrow().get(id).ok()?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        match self.inner.borrow().get(id).map(|n| &n.data) {
            Ok(NodeData::Element { attributes, .. }) => attributes.clone(),
            _ => Vec::new(),
        }
    }

    /// Replace the data of a text or comment node.
    pub fn set_text(&self, id: NodeId, text: &str) -> Result<()> {
        let mut arena = self.inner.borrow_mut();
        match &mut arena.get_mut(id)?.data {
            NodeData::Text(data) | NodeData::Comment(data) => {
                *data = text.to_string();
                Ok(())
            }
            _ => Err(WorkframeError::Document(format!(
                "node {} is not a text node",
                id.0
            ))),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// First element (document order) matching a simple selector.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let arena = self.inner.borrow();
        Ok(arena
            .descendants(self.root)
            .into_iter()
            .filter(|&id| match arena.get(id).map(|n| &n.data) {
                Ok(NodeData::Element { tag, attributes }) => selector.matches(tag, attributes),
                _ => false,
            })
            .collect())
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let arena = self.inner.borrow();
        arena.descendants(self.root).into_iter().find(|&node| {
            matches!(
                arena.get(node).map(|n| &n.data),
                Ok(NodeData::Element { attributes, .. })
                    if attributes.iter().any(|(k, v)| k == "id" && v == id)
            )
        })
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Replace every listener on an element.
    pub fn set_listeners(&self, id: NodeId, listeners: Vec<Listener>) -> Result<()> {
        self.inner.borrow_mut().get_mut(id)?.listeners = listeners;
        Ok(())
    }

    pub fn listeners(&self, id: NodeId) -> Vec<Listener> {
        self.inner
            .borrow()
            .get(id)
            .map(|n| n.listeners.clone())
            .unwrap_or_default()
    }

    /// Dispatch an event on `target`, bubbling up to the root.
    ///
    /// The propagation path is fixed before the first listener runs.
    /// Returns the event as left by the listeners.
    pub fn dispatch_event(&self, target: NodeId, mut event: Event) -> Result<Event> {
        let path = {
            let arena = self.inner.borrow();
            let mut path = vec![target];
            let mut current = arena.get(target)?.parent;
            while let Some(parent) = current {
                path.push(parent);
                current = arena.get(parent).ok().and_then(|n| n.parent);
            }
            path
        };

        event.target = Some(target);
        for node in path {
            let handlers: Vec<EventHandler> = {
                let arena = self.inner.borrow();
                match arena.get(node) {
                    Ok(n) => n
                        .listeners
                        .iter()
                        .filter(|l| l.event == event.kind)
                        .map(|l| l.handler.clone())
                        .collect(),
                    Err(_) => Vec::new(),
                }
            };
            if handlers.is_empty() {
                continue;
            }

            event.current_target = Some(node);
            for handler in handlers {
                handler(&mut event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event.current_target = None;

        Ok(event)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_new_document_has_body() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.body()).as_deref(), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
        assert_eq!(doc.outer_html(doc.root()), "<body></body>");
    }

    #[test]
    fn test_append_moves_existing_child() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();
        doc.append_child(a, span).unwrap();

        doc.append_child(b, span).unwrap();
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), vec![span]);
        assert_eq!(doc.parent(span), Some(b));
    }

    #[test]
    fn test_insert_before_and_cycle_detection() {
        let doc = Document::new();
        let list = doc.create_element("ul");
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        doc.append_child(list, second).unwrap();
        doc.insert_before(list, first, Some(second)).unwrap();
        assert_eq!(doc.children(list), vec![first, second]);
        assert_eq!(doc.next_sibling(first), Some(second));

        let err = doc.append_child(first, list).unwrap_err();
        assert!(matches!(err, WorkframeError::Document(_)));
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let doc = Document::new();
        let text = doc.create_text("hi");
        let span = doc.create_element("span");
        assert!(doc.append_child(text, span).is_err());
    }

    #[test]
    fn test_release_frees_subtree() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text("x");
        doc.append_child(doc.body(), div).unwrap();
        doc.append_child(div, text).unwrap();
        let before = doc.node_count();

        doc.release(div);
        assert_eq!(doc.node_count(), before - 2);
        assert!(!doc.exists(text));
        assert!(doc.children(doc.body()).is_empty());
    }

    #[test]
    fn test_query_selector_document_order() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.set_attribute(outer, "class", "box").unwrap();
        doc.set_attribute(inner, "class", "box").unwrap();
        doc.set_attribute(inner, "id", "app").unwrap();
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert_eq!(doc.query_selector(".box").unwrap(), Some(outer));
        assert_eq!(doc.query_selector("#app").unwrap(), Some(inner));
        assert_eq!(doc.query_selector("#nope").unwrap(), None);
        assert_eq!(doc.get_element_by_id("app"), Some(inner));
        assert_eq!(doc.query_selector_all("div").unwrap().len(), 2);
    }

    #[test]
    fn test_outer_html_escapes() {
        let doc = Document::new();
        let a = doc.create_element("a");
        doc.set_attribute(a, "title", "say \"hi\"").unwrap();
        doc.append_child(a, doc.create_text("1 < 2 & 3")).unwrap();
        doc.append_child(a, doc.create_comment("note")).unwrap();

        assert_eq!(
            doc.outer_html(a),
            "<a title=\"say &quot;hi&quot;\">1 &lt; 2 &amp; 3<!--note--></a>"
        );
        assert_eq!(doc.text_content(a), "1 < 2 & 3");
    }

    #[test]
    fn test_dispatch_bubbles_and_stops() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, button).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let log_inner = log.clone();
        doc.set_listeners(
            button,
            vec![Listener::new(
                "click",
                Rc::new(move |_ev: &mut Event| log_inner.borrow_mut().push("button")),
            )],
        )
        .unwrap();
        let log_outer = log.clone();
        doc.set_listeners(
            outer,
            vec![Listener::new(
                "click",
                Rc::new(move |ev: &mut Event| {
                    log_outer.borrow_mut().push("outer");
                    ev.stop_propagation();
                }),
            )],
        )
        .unwrap();
        let log_body = log.clone();
        doc.set_listeners(
            doc.body(),
            vec![Listener::new(
                "click",
                Rc::new(move |_ev: &mut Event| log_body.borrow_mut().push("body")),
            )],
        )
        .unwrap();

        let event = doc.dispatch_event(button, Event::new("click")).unwrap();
        assert_eq!(*log.borrow(), vec!["button", "outer"]);
        assert_eq!(event.target, Some(button));
        assert!(event.propagation_stopped());
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Document::new();
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();

        let handle = doc.clone();
        doc.set_listeners(
            button,
            vec![Listener::new(
                "click",
                Rc::new(move |ev: &mut Event| {
                    let target = ev.target.unwrap();
                    handle.set_attribute(target, "data-clicked", "yes").unwrap();
                }),
            )],
        )
        .unwrap();

        doc.dispatch_event(button, Event::new("CLICK")).unwrap();
        assert_eq!(doc.attribute(button, "data-clicked").as_deref(), Some("yes"));
    }
}

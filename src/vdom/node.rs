//! Virtual node types.
//!
//! A tree is built once per render and never mutated afterwards, except by
//! the patcher recording the live [`NodeId`] each node was rendered to.

use std::fmt;
use std::rc::Rc;

use crate::dom::{Listener, NodeId};
use crate::types::ComponentId;

/// Called with the live node once the whole patch that created it is done.
pub type InsertHook = Rc<dyn Fn(NodeId)>;

// =============================================================================
// Component Boundary
// =============================================================================

/// The patcher's view of a component instance.
///
/// A component re-renders on its own, so the subtree stored in a parent's
/// tree may be out of date. The patcher always asks the boundary for the
/// latest committed tree before diffing or removing it.
pub trait ComponentBoundary {
    fn id(&self) -> ComponentId;

    /// Latest committed tree of this component, if it was ever rendered.
    fn current(&self) -> Option<VNode>;

    /// Live root element of the latest committed tree.
    fn current_elm(&self) -> Option<NodeId> {
        self.current().and_then(|tree| tree.elm())
    }

    /// Record the tree the patcher just rendered for this component.
    fn commit(&self, tree: &VNode);

    /// The component left the tree for good.
    fn detach(&self);
}

// =============================================================================
// Node Variants
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct VText {
    pub text: String,
    pub owner: Option<ComponentId>,
    pub elm: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VComment {
    pub text: String,
    pub elm: Option<NodeId>,
}

/// Per-node lifecycle callbacks.
#[derive(Clone, Default)]
pub struct NodeHooks {
    pub insert: Option<InsertHook>,
}

impl fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHooks")
            .field("insert", &self.insert.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VElement {
    pub tag: String,
    pub key: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub listeners: Vec<Listener>,
    pub hooks: NodeHooks,
    pub children: Vec<VNode>,
    pub owner: Option<ComponentId>,
    pub elm: Option<NodeId>,
}

impl VElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Self::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn listener(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn owner(mut self, owner: ComponentId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn on_insert(mut self, hook: impl Fn(NodeId) + 'static) -> Self {
        self.hooks.insert = Some(Rc::new(hook));
        self
    }
}

/// A component boundary wrapping the tree it rendered.
#[derive(Clone)]
pub struct VComponent {
    pub boundary: Rc<dyn ComponentBoundary>,
    pub root: Box<VNode>,
}

impl fmt::Debug for VComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VComponent")
            .field("id", &self.boundary.id())
            .field("root", &self.root)
            .finish()
    }
}

// =============================================================================
// VNode
// =============================================================================

#[derive(Debug, Clone)]
pub enum VNode {
    Text(VText),
    Comment(VComment),
    Element(VElement),
    Component(VComponent),
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        VNode::Element(element)
    }
}

impl VNode {
    pub fn text(text: impl Into<String>) -> Self {
        VNode::Text(VText {
            text: text.into(),
            owner: None,
            elm: None,
        })
    }

    pub fn comment(text: impl Into<String>) -> Self {
        VNode::Comment(VComment {
            text: text.into(),
            elm: None,
        })
    }

    /// Live node this vnode was rendered to.
    pub fn elm(&self) -> Option<NodeId> {
        match self {
            VNode::Text(t) => t.elm,
            VNode::Comment(c) => c.elm,
            VNode::Element(e) => e.elm,
            VNode::Component(c) => c.boundary.current_elm().or_else(|| c.root.elm()),
        }
    }

    /// Owning root component of a text or element node.
    pub fn owner(&self) -> Option<ComponentId> {
        match self {
            VNode::Text(t) => t.owner,
            VNode::Element(e) => e.owner,
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => e.key.as_deref(),
            _ => None,
        }
    }

    /// Whether two nodes may be patched in place.
    pub fn is_same(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(_), VNode::Text(_)) => true,
            (VNode::Comment(_), VNode::Comment(_)) => true,
            (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag && a.key == b.key,
            (VNode::Component(a), VNode::Component(b)) => a.boundary.id() == b.boundary.id(),
            _ => false,
        }
    }

    /// Grouping used to pair up unkeyed siblings.
    pub(crate) fn signature(&self) -> String {
        match self {
            VNode::Text(_) => "#text".to_string(),
            VNode::Comment(_) => "#comment".to_string(),
            VNode::Element(e) => e.tag.clone(),
            VNode::Component(c) => format!("#component:{}", c.boundary.id()),
        }
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Children of an element. Other variants have none.
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(e) => &e.children,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sameness_uses_tag_and_key() {
        let a: VNode = VElement::new("li").key("1").into();
        let b: VNode = VElement::new("li").key("1").attr("class", "x").into();
        let c: VNode = VElement::new("li").key("2").into();
        let d: VNode = VElement::new("LI").key("1").into();

        assert!(a.is_same(&b));
        assert!(!a.is_same(&c));
        assert!(a.is_same(&d));
        assert!(!a.is_same(&VNode::text("li")));
        assert!(VNode::text("a").is_same(&VNode::text("b")));
    }

    #[test]
    fn test_owner_only_on_text_and_elements() {
        let el: VNode = VElement::new("div").owner(ComponentId(3)).into();
        assert_eq!(el.owner(), Some(ComponentId(3)));
        assert_eq!(VNode::comment("x").owner(), None);
    }
}

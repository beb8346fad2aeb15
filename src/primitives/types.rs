//! Primitive types - Attributes and node descriptions.
//!
//! Render closures return a [`Node`]: a plain description of elements,
//! text, nested components and fragments. The engine turns it into an
//! ownership-annotated virtual tree.

use std::fmt;
use std::rc::Rc;

use crate::dom::{Event, Listener};
use crate::engine::ComponentType;
use crate::types::{State, Value};

// =============================================================================
// Callback Types
// =============================================================================

/// Event handler callback (Rc so it can be cloned into wrappers).
pub type Handler = Rc<dyn Fn(&mut Event)>;

// =============================================================================
// Prop
// =============================================================================

/// One attribute value: plain data or an event handler.
#[derive(Clone)]
pub enum Prop {
    Value(Value),
    Handler(Handler),
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Prop::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Value(value)
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Prop::Value(Value::from(value))
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Prop::Value(Value::from(value))
    }
}

impl From<bool> for Prop {
    fn from(value: bool) -> Self {
        Prop::Value(Value::from(value))
    }
}

impl From<i64> for Prop {
    fn from(value: i64) -> Self {
        Prop::Value(Value::from(value))
    }
}

impl From<f64> for Prop {
    fn from(value: f64) -> Self {
        Prop::Value(Value::from(value))
    }
}

impl From<Handler> for Prop {
    fn from(handler: Handler) -> Self {
        Prop::Handler(handler)
    }
}

// =============================================================================
// Attrs
// =============================================================================

/// Ordered attribute list passed to [`create_node`](super::create_node).
///
/// ```ignore
/// let attrs = Attrs::new()
///     .attr("class", "counter")
///     .on("onClick", move |_| increment());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Attrs {
    entries: Vec<(String, Prop)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prop(name, Prop::Value(value.into()))
    }

    /// Bind an event handler. `name` is the full key, e.g. `onClick:stop`.
    pub fn on(self, name: impl Into<String>, handler: impl Fn(&mut Event) + 'static) -> Self {
        self.prop(name, Prop::Handler(Rc::new(handler)))
    }

    pub fn handler(self, name: impl Into<String>, handler: Handler) -> Self {
        self.prop(name, Prop::Handler(handler))
    }

    pub fn prop(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.entries.push((name.into(), prop.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.entries.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Prop)> {
        self.entries
    }
}

impl From<State> for Attrs {
    fn from(state: State) -> Self {
        Self {
            entries: state
                .into_iter()
                .map(|(name, value)| (name, Prop::Value(value)))
                .collect(),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// An element description with attributes already split from handlers.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    pub key: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub listeners: Vec<Listener>,
    pub children: Vec<Node>,
}

/// A nested component and the props it is built with.
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub component: ComponentType,
    pub key: Option<String>,
    pub props: State,
    pub children: Vec<Node>,
}

/// Output of a render closure.
#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Element(ElementNode),
    Component(ComponentNode),
    /// Children spliced into the enclosing node.
    Fragment(Vec<Node>),
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<ElementNode> for Node {
    fn from(element: ElementNode) -> Self {
        Node::Element(element)
    }
}

impl From<ComponentNode> for Node {
    fn from(component: ComponentNode) -> Self {
        Node::Component(component)
    }
}

// =============================================================================
// Value Rendering
// =============================================================================

/// DOM string for an attribute value; `None` omits the attribute.
pub(crate) fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(false) => None,
        Value::Bool(true) | Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Text for a value rendered as a text node.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

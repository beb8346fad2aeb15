//! Node construction - One entry point for tags and components.
//!
//! An element's attributes are split into DOM attributes and event
//! handlers. Handler keys look like `onClick` or `onSubmit:default:stop`:
//!
//! - the event name after `on` is lower-cased;
//! - `a`/`click` and `form`/`submit` suppress the default action unless the
//!   `default` directive is given;
//! - `prevent` always suppresses it, `stop` stops propagation after the
//!   handler ran.

use std::rc::Rc;

use crate::dom::{Event, Listener};
use crate::engine::ComponentType;
use crate::error::{Result, WorkframeError};
use crate::types::{kind_of, Directives, State, Value};

use super::types::{attribute_value, display_value, Attrs, ComponentNode, ElementNode, Handler, Node, Prop};

/// Tag/event pairs whose default action is suppressed unless `default` is
/// given.
const PREVENT_DEFAULT_PAIRS: &[(&str, &str)] = &[("a", "click"), ("form", "submit")];

/// First argument of [`create_node`].
#[derive(Debug, Clone, Copy)]
pub enum Tag<'a> {
    Name(&'a str),
    Component(&'a ComponentType),
}

impl<'a> From<&'a str> for Tag<'a> {
    fn from(name: &'a str) -> Self {
        Tag::Name(name)
    }
}

impl<'a> From<&'a ComponentType> for Tag<'a> {
    fn from(component: &'a ComponentType) -> Self {
        Tag::Component(component)
    }
}

fn is_handler_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

// =============================================================================
// Builders
// =============================================================================

/// Build an element or component node.
pub fn create_node<'a>(tag: impl Into<Tag<'a>>, attrs: Attrs, children: Vec<Node>) -> Result<Node> {
    match tag.into() {
        Tag::Name(name) => element(name, attrs, children),
        Tag::Component(component) => self::component(component, attrs, children),
    }
}

/// Build an element node.
pub fn element(tag: &str, attrs: Attrs, children: Vec<Node>) -> Result<Node> {
    let tag = tag.to_lowercase();
    let mut key = None;
    let mut dom_attrs: Vec<(String, String)> = Vec::new();
    let mut listeners = Vec::new();

    for (name, prop) in attrs.into_entries() {
        match prop {
            Prop::Handler(handler) if is_handler_key(&name) => {
                listeners.push(bind_handler(&tag, &name, handler)?);
            }
            Prop::Handler(_) => {
                return Err(WorkframeError::InvalidArgument(format!(
                    "event handler bound to non-event attribute {name:?}"
                )));
            }
            Prop::Value(value) if is_handler_key(&name) => {
                return Err(WorkframeError::HandlerTypeError(format!(
                    "{name} on <{tag}> is {}",
                    kind_of(&value)
                )));
            }
            Prop::Value(value) if name == "key" => {
                key = Some(display_value(&value));
            }
            Prop::Value(value) => {
                dom_attrs.retain(|(existing, _)| *existing != name);
                if let Some(value) = attribute_value(&value) {
                    dom_attrs.push((name, value));
                }
            }
        }
    }

    Ok(Node::Element(ElementNode {
        tag,
        key,
        attrs: dom_attrs,
        listeners,
        children,
    }))
}

/// Build a component node. Attributes become the component's props.
pub fn component(component: &ComponentType, attrs: Attrs, children: Vec<Node>) -> Result<Node> {
    let mut key = None;
    let mut props = State::new();

    for (name, prop) in attrs.into_entries() {
        if is_handler_key(&name) {
            return Err(WorkframeError::InvalidArgument(format!(
                "event handlers cannot be attached to components ({name} on {})",
                component.name()
            )));
        }
        match prop {
            Prop::Value(value) if name == "key" => key = Some(display_value(&value)),
            Prop::Value(value) => {
                props.insert(name, value);
            }
            Prop::Handler(_) => {
                return Err(WorkframeError::InvalidArgument(format!(
                    "component prop {name:?} cannot hold an event handler"
                )));
            }
        }
    }

    Ok(Node::Component(ComponentNode {
        component: component.clone(),
        key,
        props,
        children,
    }))
}

/// A text node showing a value.
pub fn text(value: impl Into<Value>) -> Node {
    Node::Text(display_value(&value.into()))
}

/// A list of children spliced into the enclosing node.
pub fn fragment(children: Vec<Node>) -> Node {
    Node::Fragment(children)
}

// =============================================================================
// Handler Binding
// =============================================================================

fn bind_handler(tag: &str, key: &str, handler: Handler) -> Result<Listener> {
    let mut parts = key[2..].split(':');
    let event = parts.next().unwrap_or_default().to_lowercase();
    if event.is_empty() {
        return Err(WorkframeError::InvalidArgument(format!(
            "missing event name in {key:?}"
        )));
    }

    let mut directives = Directives::NONE;
    for part in parts {
        let name = part.to_lowercase();
        directives |= Directives::parse(&name).ok_or_else(|| {
            WorkframeError::InvalidArgument(format!("unknown event directive {part:?} in {key:?}"))
        })?;
    }

    let designated = PREVENT_DEFAULT_PAIRS
        .iter()
        .any(|&(pair_tag, pair_event)| pair_tag == tag && pair_event == event);
    let prevent = directives.contains(Directives::PREVENT)
        || (designated && !directives.contains(Directives::DEFAULT));
    let stop = directives.contains(Directives::STOP);

    let handler: Handler = if prevent || stop {
        Rc::new(move |ev: &mut Event| {
            if prevent {
                ev.prevent_default();
            }
            handler(ev);
            if stop {
                ev.stop_propagation();
            }
        })
    } else {
        handler
    };

    Ok(Listener::new(event, handler))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{render, reset_registry};
    use serde_json::json;
    use std::cell::Cell;

    fn as_element(node: Node) -> ElementNode {
        match node {
            Node::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    fn fire(listener: &Listener) -> Event {
        let mut event = Event::new(listener.event.clone());
        (listener.handler)(&mut event);
        event
    }

    #[test]
    fn test_attributes_split_from_handlers() {
        let node = element(
            "BUTTON",
            Attrs::new()
                .attr("class", "primary")
                .attr("disabled", false)
                .attr("key", 7)
                .on("onClick", |_| {}),
            vec![text("Go")],
        )
        .unwrap();
        let el = as_element(node);

        assert_eq!(el.tag, "button");
        assert_eq!(el.key.as_deref(), Some("7"));
        assert_eq!(el.attrs, vec![("class".to_string(), "primary".to_string())]);
        assert_eq!(el.listeners.len(), 1);
        assert_eq!(el.listeners[0].event, "click");
    }

    #[test]
    fn test_later_duplicate_attribute_wins() {
        let el = as_element(
            element("p", Attrs::new().attr("title", "a").attr("title", "b"), vec![]).unwrap(),
        );
        assert_eq!(el.attrs, vec![("title".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_value_under_handler_key_is_handler_type_error() {
        let err = element("div", Attrs::new().attr("onClick", "nope"), vec![]).unwrap_err();
        assert!(matches!(err, WorkframeError::HandlerTypeError(_)));
    }

    #[test]
    fn test_handler_under_plain_key_is_invalid() {
        let err = element("div", Attrs::new().on("title", |_| {}), vec![]).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
    }

    #[test]
    fn test_anchor_click_prevents_default() {
        let el = as_element(element("a", Attrs::new().on("onClick", |_| {}), vec![]).unwrap());
        assert!(fire(&el.listeners[0]).default_prevented());

        let el = as_element(element("a", Attrs::new().on("onClick:default", |_| {}), vec![]).unwrap());
        assert!(!fire(&el.listeners[0]).default_prevented());

        let el = as_element(element("div", Attrs::new().on("onClick", |_| {}), vec![]).unwrap());
        assert!(!fire(&el.listeners[0]).default_prevented());
    }

    #[test]
    fn test_form_submit_and_directives() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let el = as_element(
            element(
                "form",
                Attrs::new().on("onSubmit:stop", move |_| counter.set(counter.get() + 1)),
                vec![],
            )
            .unwrap(),
        );
        let event = fire(&el.listeners[0]);
        assert_eq!(el.listeners[0].event, "submit");
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(calls.get(), 1);

        let el = as_element(element("span", Attrs::new().on("onKeyDown:prevent", |_| {}), vec![]).unwrap());
        assert_eq!(el.listeners[0].event, "keydown");
        assert!(fire(&el.listeners[0]).default_prevented());
    }

    #[test]
    fn test_unknown_directive_is_invalid() {
        let err = element("a", Attrs::new().on("onClick:bogus", |_| {}), vec![]).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
    }

    #[test]
    fn test_component_rejects_handlers() {
        reset_registry();
        let counter = ComponentType::new("Counter", |_ctx| render(|_state, _children| Ok(text(""))));

        let err = component(&counter, Attrs::new().on("onClick", |_| {}), vec![]).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));

        let err = component(&counter, Attrs::new().attr("onChange", 1), vec![]).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
    }

    #[test]
    fn test_component_props_and_key() {
        reset_registry();
        let item = ComponentType::new("Item", |_ctx| render(|_state, _children| Ok(text(""))));
        let node = create_node(&item, Attrs::new().attr("key", "k1").attr("label", "A"), vec![]).unwrap();

        let Node::Component(node) = node else { panic!("expected component") };
        assert_eq!(node.key.as_deref(), Some("k1"));
        assert_eq!(node.props.get("label"), Some(&json!("A")));
        assert!(!node.props.contains_key("key"));
    }
}

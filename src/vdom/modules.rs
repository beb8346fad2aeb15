//! Patch modules - Pluggable per-node synchronization.
//!
//! Modules see text, comment and element nodes. Component boundaries are
//! transparent: a module sees the nodes inside them, never the boundary.

use crate::dom::Document;
use crate::error::Result;

use super::node::VNode;

/// Callbacks invoked by the [`Patcher`](super::Patcher) while it mutates the
/// document.
pub trait PatchModule {
    /// A node was created. Its `elm` and its children already exist.
    fn create(&mut self, _doc: &Document, _vnode: &VNode) -> Result<()> {
        Ok(())
    }

    /// A node was patched in place. `changed` is false when the node's own
    /// value (text, or attributes for an element) is identical to before.
    fn update(&mut self, _doc: &Document, _old: &VNode, _new: &VNode, _changed: bool) -> Result<()> {
        Ok(())
    }

    /// Called once for the root of every removed subtree, before the
    /// subtree leaves the document.
    fn remove(&mut self, _doc: &Document, _vnode: &VNode) -> Result<()> {
        Ok(())
    }

    /// Called for every node of a removed subtree.
    fn destroy(&mut self, _doc: &Document, _vnode: &VNode) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Keeps element attributes in sync.
#[derive(Debug, Default)]
pub struct AttributesModule;

impl PatchModule for AttributesModule {
    fn create(&mut self, doc: &Document, vnode: &VNode) -> Result<()> {
        if let (VNode::Element(el), Some(elm)) = (vnode, vnode.elm()) {
            for (name, value) in &el.attrs {
                doc.set_attribute(elm, name, value)?;
            }
        }
        Ok(())
    }

    fn update(&mut self, doc: &Document, old: &VNode, new: &VNode, changed: bool) -> Result<()> {
        if !changed {
            return Ok(());
        }
        let (VNode::Element(old), VNode::Element(new)) = (old, new) else {
            return Ok(());
        };
        let Some(elm) = new.elm else { return Ok(()) };

        for (name, _) in &old.attrs {
            if !new.attrs.iter().any(|(n, _)| n == name) {
                doc.remove_attribute(elm, name)?;
            }
        }
        for (name, value) in &new.attrs {
            let previous = old.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v);
            if previous != Some(value) {
                log::trace!("set attribute {name}={value:?} on node {}", elm.0);
                doc.set_attribute(elm, name, value)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Event Listeners
// =============================================================================

/// Installs the element's listeners. Handlers are closures and cannot be
/// compared, so they are replaced on every update.
#[derive(Debug, Default)]
pub struct EventListenersModule;

impl PatchModule for EventListenersModule {
    fn create(&mut self, doc: &Document, vnode: &VNode) -> Result<()> {
        if let (VNode::Element(el), Some(elm)) = (vnode, vnode.elm()) {
            if !el.listeners.is_empty() {
                doc.set_listeners(elm, el.listeners.clone())?;
            }
        }
        Ok(())
    }

    fn update(&mut self, doc: &Document, old: &VNode, new: &VNode, _changed: bool) -> Result<()> {
        if let (VNode::Element(old), VNode::Element(new)) = (old, new) {
            if let Some(elm) = new.elm {
                if !(old.listeners.is_empty() && new.listeners.is_empty()) {
                    doc.set_listeners(elm, new.listeners.clone())?;
                }
            }
        }
        Ok(())
    }
}

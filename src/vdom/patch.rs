//! Patcher - Diff a new virtual tree against the live document.
//!
//! # Algorithm
//!
//! - Same nodes (see [`VNode::is_same`]) are patched in place, different
//!   nodes are replaced.
//! - Children are paired by key first, then unkeyed children by kind in
//!   order. New children are created, then one backward pass over the new
//!   order moves live nodes into place.
//! - Removals are deferred until the whole tree is patched, so a component
//!   that moved to another parent keeps its instance.
//! - Insert hooks run last, in creation order (children before parents).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::dom::{Document, NodeId};
use crate::error::{Result, WorkframeError};
use crate::types::ComponentId;

use super::modules::{AttributesModule, EventListenersModule, PatchModule};
use super::node::{InsertHook, VComponent, VNode};

/// What a new tree is patched onto.
#[derive(Debug)]
pub enum PatchTarget {
    /// A raw element, replaced by the new tree.
    Element(NodeId),
    /// The previous tree.
    VNode(VNode),
}

impl From<NodeId> for PatchTarget {
    fn from(id: NodeId) -> Self {
        PatchTarget::Element(id)
    }
}

impl From<VNode> for PatchTarget {
    fn from(vnode: VNode) -> Self {
        PatchTarget::VNode(vnode)
    }
}

fn unrendered() -> WorkframeError {
    WorkframeError::Document("patching a tree that was never rendered".to_string())
}

fn detached(id: NodeId) -> WorkframeError {
    WorkframeError::Document(format!("node {} has no parent to patch into", id.0))
}

// =============================================================================
// Patcher
// =============================================================================

pub struct Patcher {
    modules: Vec<Box<dyn PatchModule>>,
    inserted: Vec<(InsertHook, NodeId)>,
    removals: Vec<VNode>,
    /// Components rendered by the current patch.
    claimed: HashSet<ComponentId>,
}

impl Patcher {
    pub fn new(modules: Vec<Box<dyn PatchModule>>) -> Self {
        Self {
            modules,
            inserted: Vec::new(),
            removals: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    /// Patcher with attribute and listener synchronization.
    pub fn with_default_modules() -> Self {
        Self::new(vec![
            Box::new(AttributesModule),
            Box::new(EventListenersModule),
        ])
    }

    pub fn push_module(&mut self, module: impl PatchModule + 'static) {
        self.modules.push(Box::new(module));
    }

    /// Make the document match `new` and return it with its live nodes
    /// recorded.
    pub fn patch(
        &mut self,
        doc: &Document,
        target: impl Into<PatchTarget>,
        new: VNode,
    ) -> Result<VNode> {
        self.inserted.clear();
        self.removals.clear();
        self.claimed.clear();

        let mut new = new;
        match target.into() {
            PatchTarget::Element(elm) => {
                let parent = doc.parent(elm).ok_or_else(|| detached(elm))?;
                self.create_elm(doc, &mut new)?;
                let created = new.elm().ok_or_else(unrendered)?;
                doc.insert_before(parent, created, Some(elm))?;
                doc.release(elm);
            }
            PatchTarget::VNode(old) => {
                if old.is_same(&new) {
                    self.patch_vnode(doc, old, &mut new)?;
                } else {
                    self.replace(doc, old, &mut new)?;
                }
            }
        }

        for removed in std::mem::take(&mut self.removals) {
            self.remove_vnode(doc, removed)?;
        }
        for (hook, elm) in std::mem::take(&mut self.inserted) {
            hook(elm);
        }

        Ok(new)
    }

    /// Remove a rendered tree from the document, running module callbacks.
    pub fn remove(&mut self, doc: &Document, vnode: VNode) -> Result<()> {
        self.claimed.clear();
        self.remove_vnode(doc, vnode)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    fn create_elm(&mut self, doc: &Document, vnode: &mut VNode) -> Result<()> {
        match vnode {
            VNode::Text(text) => text.elm = Some(doc.create_text(&text.text)),
            VNode::Comment(comment) => comment.elm = Some(doc.create_comment(&comment.text)),
            VNode::Element(el) => {
                let elm = doc.create_element(&el.tag);
                for child in &mut el.children {
                    self.create_elm(doc, child)?;
                    if let Some(child_elm) = child.elm() {
                        doc.append_child(elm, child_elm)?;
                    }
                }
                el.elm = Some(elm);
                if let Some(hook) = &el.hooks.insert {
                    self.inserted.push((hook.clone(), elm));
                }
            }
            VNode::Component(component) => {
                self.create_elm(doc, &mut component.root)?;
                component.boundary.commit(&component.root);
                self.claimed.insert(component.boundary.id());
                return Ok(());
            }
        }

        for module in &mut self.modules {
            module.create(doc, vnode)?;
        }
        Ok(())
    }

    /// Build `new` and put it where `old` is. `old` is queued for removal.
    fn replace(&mut self, doc: &Document, old: VNode, new: &mut VNode) -> Result<()> {
        let old_elm = old.elm().ok_or_else(unrendered)?;
        let parent = doc.parent(old_elm).ok_or_else(|| detached(old_elm))?;

        self.create_elm(doc, new)?;
        if let Some(elm) = new.elm() {
            doc.insert_before(parent, elm, Some(old_elm))?;
        }
        log::trace!("replaced node {} in node {}", old_elm.0, parent.0);

        self.removals.push(old);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // In-place Patch
    // -------------------------------------------------------------------------

    fn patch_vnode(&mut self, doc: &Document, old: VNode, new: &mut VNode) -> Result<()> {
        let (old, changed) = match (old, &mut *new) {
            (VNode::Text(old_text), VNode::Text(new_text)) => {
                let elm = old_text.elm.ok_or_else(unrendered)?;
                new_text.elm = Some(elm);
                let changed = old_text.text != new_text.text;
                if changed {
                    doc.set_text(elm, &new_text.text)?;
                }
                (VNode::Text(old_text), changed)
            }
            (VNode::Comment(old_comment), VNode::Comment(new_comment)) => {
                let elm = old_comment.elm.ok_or_else(unrendered)?;
                new_comment.elm = Some(elm);
                let changed = old_comment.text != new_comment.text;
                if changed {
                    doc.set_text(elm, &new_comment.text)?;
                }
                (VNode::Comment(old_comment), changed)
            }
            (VNode::Element(mut old_el), VNode::Element(new_el)) => {
                let elm = old_el.elm.ok_or_else(unrendered)?;
                new_el.elm = Some(elm);
                let changed = old_el.attrs != new_el.attrs;
                let old_children = std::mem::take(&mut old_el.children);
                self.update_children(doc, elm, old_children, &mut new_el.children)?;
                (VNode::Element(old_el), changed)
            }
            (VNode::Component(old_component), VNode::Component(new_component)) => {
                let previous = old_component
                    .boundary
                    .current()
                    .unwrap_or(*old_component.root);
                if previous.is_same(&new_component.root) {
                    self.patch_vnode(doc, previous, &mut new_component.root)?;
                } else {
                    self.replace(doc, previous, &mut new_component.root)?;
                }
                new_component.boundary.commit(&new_component.root);
                self.claimed.insert(new_component.boundary.id());
                return Ok(());
            }
            (old, new) => return self.replace(doc, old, new),
        };

        for module in &mut self.modules {
            module.update(doc, &old, new, changed)?;
        }
        Ok(())
    }

    fn update_children(
        &mut self,
        doc: &Document,
        parent: NodeId,
        old: Vec<VNode>,
        new: &mut [VNode],
    ) -> Result<()> {
        let mut keyed: HashMap<String, usize> = HashMap::new();
        let mut unkeyed: HashMap<String, VecDeque<usize>> = HashMap::new();
        for (index, child) in old.iter().enumerate() {
            match child.key() {
                Some(key) => {
                    keyed.insert(key.to_string(), index);
                }
                None => unkeyed.entry(child.signature()).or_default().push_back(index),
            }
        }
        let mut old: Vec<Option<VNode>> = old.into_iter().map(Some).collect();

        let mut elms = Vec::with_capacity(new.len());
        for child in new.iter_mut() {
            let matched = match child.key() {
                Some(key) => keyed.remove(key).filter(|&index| {
                    old[index]
                        .as_ref()
                        .is_some_and(|previous| previous.is_same(child))
                }),
                None => unkeyed
                    .get_mut(&child.signature())
                    .and_then(VecDeque::pop_front),
            };

            match matched.and_then(|index| old[index].take()) {
                Some(previous) => self.patch_vnode(doc, previous, child)?,
                None => self.create_elm(doc, child)?,
            }
            if let Some(elm) = child.elm() {
                elms.push(elm);
            }
        }

        self.removals.extend(old.into_iter().flatten());

        let mut next: Option<NodeId> = None;
        for &elm in elms.iter().rev() {
            let in_place = doc.parent(elm) == Some(parent) && doc.next_sibling(elm) == next;
            if !in_place {
                doc.insert_before(parent, elm, next)?;
            }
            next = Some(elm);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Tree a removed component boundary should tear down: its latest
    /// committed tree, or the stored one if this patch re-rendered it
    /// elsewhere.
    fn removed_tree(&self, component: &VComponent) -> (VNode, bool) {
        if self.claimed.contains(&component.boundary.id()) {
            ((*component.root).clone(), true)
        } else {
            let tree = component
                .boundary
                .current()
                .unwrap_or_else(|| (*component.root).clone());
            (tree, false)
        }
    }

    fn remove_vnode(&mut self, doc: &Document, vnode: VNode) -> Result<()> {
        if let VNode::Component(component) = &vnode {
            let (tree, claimed) = self.removed_tree(component);
            self.remove_vnode(doc, tree)?;
            if !claimed {
                component.boundary.detach();
            }
            return Ok(());
        }

        for module in &mut self.modules {
            module.remove(doc, &vnode)?;
        }
        self.destroy(doc, &vnode)?;
        if let Some(elm) = vnode.elm() {
            doc.release(elm);
        }
        Ok(())
    }

    fn destroy(&mut self, doc: &Document, vnode: &VNode) -> Result<()> {
        if let VNode::Component(component) = vnode {
            let (tree, claimed) = self.removed_tree(component);
            self.destroy(doc, &tree)?;
            if !claimed {
                component.boundary.detach();
            }
            return Ok(());
        }

        for module in &mut self.modules {
            module.destroy(doc, vnode)?;
        }
        for child in vnode.children() {
            self.destroy(doc, child)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

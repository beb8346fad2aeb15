//! Tree Builder - Render output → ownership-annotated virtual tree.
//!
//! For one instance's render:
//!
//! 1. Text and element nodes get the instance as owner. Nested components
//!    build their own subtrees, so the owner is always the nearest one.
//! 2. Fragments are flattened into their parent's children.
//! 3. Nested components are matched to the previous render's instances by
//!    mount site and re-rendered with their new props.
//! 4. A hidden marker element is appended to the root. Its insert hook tells
//!    the reconciler the instance entered the document.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::Result;
use crate::pipeline::reconciler;
use crate::primitives::{ComponentNode, Node};
use crate::types::{ComponentId, ComponentTypeId, Lifecycle};
use crate::vdom::{VComponent, VElement, VNode, VText};

use super::component::{ComponentInstance, InstanceContext};
use super::registry;

/// Key of the hidden marker appended to every component root.
pub const MOUNT_MARKER_KEY: &str = "__workframe_mount";

// =============================================================================
// Mount Sites
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SiteSlot {
    Key(String),
    Ordinal(usize),
    /// A repeated key; never matched across renders.
    Duplicate(usize),
}

/// Where a nested component sits in its parent's render output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SiteKey {
    component: ComponentTypeId,
    slot: SiteSlot,
}

// =============================================================================
// Builder
// =============================================================================

struct TreeBuilder<'a> {
    owner: &'a ComponentInstance,
    previous: HashMap<SiteKey, Rc<ComponentInstance>>,
    next: HashMap<SiteKey, Rc<ComponentInstance>>,
    reused: HashSet<ComponentId>,
    ordinals: HashMap<ComponentTypeId, usize>,
    duplicates: usize,
}

/// Build `owner`'s tree from its raw render output.
///
/// On failure the owner keeps its previous nested instances, and instances
/// created by the failed build are detached.
pub(crate) fn build_tree(owner: &ComponentInstance, raw: Node) -> Result<VNode> {
    let previous = owner.sites.take();
    let mut builder = TreeBuilder {
        owner,
        previous,
        next: HashMap::new(),
        reused: HashSet::new(),
        ordinals: HashMap::new(),
        duplicates: 0,
    };

    match builder.build_root(raw) {
        Ok(tree) => {
            *owner.sites.borrow_mut() = builder.next;
            Ok(tree)
        }
        Err(err) => {
            let mut sites = builder.previous;
            for (site, instance) in builder.next {
                if builder.reused.contains(&instance.id()) {
                    sites.insert(site, instance);
                } else {
                    instance.detach();
                }
            }
            *owner.sites.borrow_mut() = sites;
            Err(err)
        }
    }
}

impl TreeBuilder<'_> {
    fn build_root(&mut self, raw: Node) -> Result<VNode> {
        let mut nodes = Vec::new();
        self.build_into(raw, &mut nodes)?;

        let mut root = match <[VNode; 1]>::try_from(nodes) {
            Ok([VNode::Element(element)]) => element,
            Ok([other]) => self.wrapper(vec![other]),
            Err(nodes) => self.wrapper(nodes),
        };
        root.children.push(self.marker());

        Ok(VNode::Element(root))
    }

    fn build_into(&mut self, raw: Node, out: &mut Vec<VNode>) -> Result<()> {
        let owner = Some(self.owner.id());
        match raw {
            Node::Text(text) => out.push(VNode::Text(VText {
                text,
                owner,
                elm: None,
            })),
            Node::Fragment(children) => {
                for child in children {
                    self.build_into(child, out)?;
                }
            }
            Node::Element(element) => {
                let mut children = Vec::with_capacity(element.children.len());
                for child in element.children {
                    self.build_into(child, &mut children)?;
                }
                out.push(VNode::Element(VElement {
                    tag: element.tag,
                    key: element.key,
                    attrs: element.attrs,
                    listeners: element.listeners,
                    hooks: Default::default(),
                    children,
                    owner,
                    elm: None,
                }));
            }
            Node::Component(component) => out.push(self.build_component(component)?),
        }
        Ok(())
    }

    fn build_component(&mut self, node: ComponentNode) -> Result<VNode> {
        let site = self.site_key(&node);

        let instance = match self.previous.remove(&site) {
            Some(existing) if existing.lifecycle() != Lifecycle::Unmounted => {
                existing.receive_props(&node.props);
                self.reused.insert(existing.id());
                existing
            }
            _ => {
                let created = registry::get_or_register_factory(&node.component).create(
                    node.props.clone(),
                    InstanceContext {
                        document: self.owner.document().clone(),
                        depth: self.owner.depth() + 1,
                    },
                );
                created.receive_props(&node.props);
                created
            }
        };
        self.next.insert(site, instance.clone());

        instance.set_slot(node.children);
        let root = instance.render_root()?;

        Ok(VNode::Component(VComponent {
            boundary: instance,
            root: Box::new(root),
        }))
    }

    fn site_key(&mut self, node: &ComponentNode) -> SiteKey {
        let component = node.component.id();
        let slot = match &node.key {
            Some(key) => SiteSlot::Key(key.clone()),
            None => {
                let ordinal = self.ordinals.entry(component).or_insert(0);
                *ordinal += 1;
                SiteSlot::Ordinal(*ordinal - 1)
            }
        };

        let mut site = SiteKey { component, slot };
        if self.next.contains_key(&site) {
            log::warn!(
                "duplicate key {:?} for {} inside {}; instance will not be preserved",
                node.key,
                node.component.name(),
                self.owner.component().name()
            );
            self.duplicates += 1;
            site.slot = SiteSlot::Duplicate(self.duplicates);
        }
        site
    }

    fn wrapper(&self, children: Vec<VNode>) -> VElement {
        VElement {
            children,
            ..VElement::new("div").owner(self.owner.id())
        }
    }

    fn marker(&self) -> VNode {
        let instance = self.owner.self_ref.clone();
        VElement::new("div")
            .key(MOUNT_MARKER_KEY)
            .attr("style", "display: none")
            .owner(self.owner.id())
            .child(VNode::comment("MOUNT HOOK"))
            .on_insert(move |_elm| {
                if let Some(instance) = instance.upgrade() {
                    reconciler::component_attached(&instance);
                }
            })
            .into()
    }
}

// =============================================================================
// Tests
// =============================================================================

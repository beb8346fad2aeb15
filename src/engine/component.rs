//! Components - Types, factories and live instances.
//!
//! A [`ComponentType`] is the registered handle for a setup function. Its
//! [`ComponentFactory`] runs setup once per instance; the returned render
//! closure is then re-invoked on every render of that instance.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::pipeline::reconciler;
use crate::primitives::Node;
use crate::state::{HookAction, SetupContext, StateHandle};
use crate::types::{ComponentId, ComponentTypeId, Lifecycle, State, Value};
use crate::vdom::{ComponentBoundary, VNode};

use super::builder::{self, SiteKey};
use super::registry;

// =============================================================================
// Component Type
// =============================================================================

/// Render closure produced by a setup function.
pub type RenderFn = Box<dyn Fn(&State, Vec<Node>) -> Result<Node>>;

/// Box a render closure.
pub fn render(f: impl Fn(&State, Vec<Node>) -> Result<Node> + 'static) -> RenderFn {
    Box::new(f)
}

type SetupFn = Rc<dyn Fn(&mut SetupContext) -> RenderFn>;

/// Registered component type.
///
/// Clones share identity: every clone maps to the same factory.
#[derive(Clone)]
pub struct ComponentType {
    id: ComponentTypeId,
    name: Rc<str>,
    setup: SetupFn,
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl ComponentType {
    pub fn new(name: &str, setup: impl Fn(&mut SetupContext) -> RenderFn + 'static) -> Self {
        Self {
            id: registry::allocate_type_id(),
            name: Rc::from(name),
            setup: Rc::new(setup),
        }
    }

    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for [`ComponentType::new`].
pub fn define(name: &str, setup: impl Fn(&mut SetupContext) -> RenderFn + 'static) -> ComponentType {
    ComponentType::new(name, setup)
}

// =============================================================================
// Factory
// =============================================================================

/// Where a new instance lives.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    pub document: Document,
    /// Nesting depth; the mounted root is 0.
    pub depth: usize,
}

/// Creates instances of one component type. Stateless between creations.
pub struct ComponentFactory {
    component: ComponentType,
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("component", &self.component)
            .finish()
    }
}

impl ComponentFactory {
    pub(crate) fn new(component: ComponentType) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &ComponentType {
        &self.component
    }

    /// Run setup once and build a registered instance.
    ///
    /// The hooks declared during setup are drained into the instance before
    /// anything else can run.
    pub fn create(&self, initial: State, context: InstanceContext) -> Rc<ComponentInstance> {
        let state = StateHandle::new(initial);
        let mut setup_context = SetupContext::new(state.clone());
        let render = (self.component.setup)(&mut setup_context);

        let mut hooks = setup_context.into_hooks();
        let mount_actions = hooks.consume_mount_actions();
        let render_actions = hooks.consume_render_actions();

        let id = registry::allocate_component_id();
        let instance = Rc::new_cyclic(|self_ref| ComponentInstance {
            id,
            component: self.component.clone(),
            depth: context.depth,
            document: context.document,
            state: state.clone(),
            render,
            mount_actions: RefCell::new(mount_actions),
            render_actions: RefCell::new(render_actions),
            lifecycle: Cell::new(Lifecycle::Unattached),
            mount_ran: Cell::new(false),
            current: RefCell::new(None),
            sites: RefCell::new(HashMap::new()),
            slot: RefCell::new(Vec::new()),
            props: RefCell::new(State::new()),
            self_ref: self_ref.clone(),
        });

        state.bind(Rc::new(move || reconciler::render_component(id)));
        registry::register_instance(&instance);
        log::debug!(
            "created {} {id} at depth {}",
            self.component.name(),
            instance.depth
        );

        instance
    }
}

// =============================================================================
// Instance
// =============================================================================

/// One live occurrence of a component.
pub struct ComponentInstance {
    id: ComponentId,
    component: ComponentType,
    depth: usize,
    document: Document,
    state: StateHandle,
    render: RenderFn,
    mount_actions: RefCell<Vec<HookAction>>,
    render_actions: RefCell<Vec<HookAction>>,
    lifecycle: Cell<Lifecycle>,
    mount_ran: Cell<bool>,
    /// Latest committed tree.
    current: RefCell<Option<VNode>>,
    /// Nested instances by mount site, from the latest render.
    pub(crate) sites: RefCell<HashMap<SiteKey, Rc<ComponentInstance>>>,
    /// Children passed in by the parent.
    slot: RefCell<Vec<Node>>,
    /// Props from the parent's latest render.
    props: RefCell<State>,
    pub(crate) self_ref: Weak<ComponentInstance>,
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("component", &self.component.name())
            .field("depth", &self.depth)
            .field("lifecycle", &self.lifecycle.get())
            .finish_non_exhaustive()
    }
}

impl ComponentInstance {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn component(&self) -> &ComponentType {
        &self.component
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    /// Latest committed tree.
    pub fn tree(&self) -> Option<VNode> {
        self.current.borrow().clone()
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.current.borrow().as_ref().and_then(VNode::elm)
    }

    pub fn mount_action_count(&self) -> usize {
        self.mount_actions.borrow().len()
    }

    pub fn render_action_count(&self) -> usize {
        self.render_actions.borrow().len()
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Invoke the render closure with `state` and `children` and build the
    /// ownership-annotated tree, marker included.
    pub fn create_node(&self, state: &State, children: Vec<Node>) -> Result<VNode> {
        let raw = (self.render)(state, children)?;
        builder::build_tree(self, raw)
    }

    /// Render with the current state and slot children.
    pub(crate) fn render_root(&self) -> Result<VNode> {
        let state = self.state.snapshot();
        let children = self.slot.borrow().clone();
        self.create_node(&state, children)
    }

    pub(crate) fn set_slot(&self, children: Vec<Node>) {
        *self.slot.borrow_mut() = children;
    }

    /// Merge props from a parent render. Does not re-render.
    ///
    /// A prop passed by the previous render but not by this one becomes
    /// `null`. Returns true if the state changed.
    pub(crate) fn receive_props(&self, props: &State) -> bool {
        let mut merged = props.clone();
        for name in self.props.borrow().keys() {
            if !props.contains_key(name) {
                merged.insert(name.clone(), Value::Null);
            }
        }
        *self.props.borrow_mut() = props.clone();
        self.state.merge_silently(&merged)
    }

    /// Replace the whole state without re-rendering. Returns true if it
    /// differed.
    pub(crate) fn replace_state(&self, state: &State) -> bool {
        self.state.replace_silently(state)
    }

    // -------------------------------------------------------------------------
    // Hooks
    // -------------------------------------------------------------------------

    /// Run the mount actions. Only the first call does anything.
    pub fn run_on_mount_actions(&self) -> anyhow::Result<()> {
        if self.mount_ran.replace(true) {
            return Ok(());
        }
        run_actions(self.id, "mount", &self.mount_actions, &self.state)
    }

    /// Run every render action in order. The first failure stops the rest.
    pub fn run_on_render_actions(&self) -> anyhow::Result<()> {
        run_actions(self.id, "render", &self.render_actions, &self.state)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// `Unattached → Mounted`. Returns false if the instance was attached
    /// before.
    pub(crate) fn mark_attached(&self) -> bool {
        if self.lifecycle.get() != Lifecycle::Unattached {
            return false;
        }
        self.lifecycle.set(Lifecycle::Mounted);
        true
    }

    /// `→ Unmounted`: stop rendering, leave the registry, detach children.
    pub(crate) fn detach(&self) {
        if self.lifecycle.get() == Lifecycle::Unmounted {
            return;
        }
        self.lifecycle.set(Lifecycle::Unmounted);
        self.state.unbind();
        registry::release_instance(self.id);
        registry::release_root(self.id);
        self.current.borrow_mut().take();

        let children: Vec<_> = self.sites.borrow_mut().drain().map(|(_, child)| child).collect();
        for child in children {
            child.detach();
        }
        log::debug!("detached {} {}", self.component.name(), self.id);
    }
}

fn run_actions(
    id: ComponentId,
    kind: &str,
    actions: &RefCell<Vec<HookAction>>,
    state: &StateHandle,
) -> anyhow::Result<()> {
    let mut actions = actions
        .try_borrow_mut()
        .map_err(|_| anyhow::anyhow!("{kind} actions of {id} are already running"))?;
    for action in actions.iter_mut() {
        let snapshot = state.snapshot();
        action(&snapshot).map_err(|err| err.context(format!("{kind} action of {id} failed")))?;
    }
    Ok(())
}

impl ComponentBoundary for ComponentInstance {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn current(&self) -> Option<VNode> {
        self.tree()
    }

    fn current_elm(&self) -> Option<NodeId> {
        self.root_element()
    }

    fn commit(&self, tree: &VNode) {
        if self.lifecycle.get() != Lifecycle::Unmounted {
            *self.current.borrow_mut() = Some(tree.clone());
        }
    }

    fn detach(&self) {
        ComponentInstance::detach(self);
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Mount API - Root component lifecycle.
//!
//! This module provides the entry point for rendering an application into
//! a document. The target element is substituted by the rendered tree; it
//! is not kept as a parent.
//!
//! # Example
//!
//! ```ignore
//! use workframe::{mount, json, scheduler, Document};
//!
//! let doc = Document::new();
//! let app = doc.create_element("div");
//! doc.set_attribute(app, "id", "app")?;
//! doc.append_child(doc.body(), app)?;
//!
//! let handle = mount(&doc, &counter, "#app", json!({"count": 0}))?;
//! scheduler::tick()?; // mount hooks
//!
//! handle.state().set_field("count", 1)?;
//! scheduler::tick()?; // render hooks
//!
//! handle.unmount()?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use spark_signals::{effect, signal, Signal};

use crate::dom::{Document, NodeId};
use crate::engine::{
    get_or_register_factory, retain_root, ComponentInstance, ComponentType, InstanceContext,
};
use crate::error::{Result, WorkframeError};
use crate::primitives::Node;
use crate::state::StateHandle;
use crate::types::{state_from, Action, ComponentId, State, Value};
use crate::vdom::VNode;

use super::reconciler;

// =============================================================================
// Mount Target
// =============================================================================

/// Element a root component replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountTarget<'a> {
    /// First element matching a simple selector (`#id`, `.class`, `tag`).
    Selector(&'a str),
    Element(NodeId),
}

impl<'a> From<&'a str> for MountTarget<'a> {
    fn from(selector: &'a str) -> Self {
        MountTarget::Selector(selector)
    }
}

impl From<NodeId> for MountTarget<'_> {
    fn from(id: NodeId) -> Self {
        MountTarget::Element(id)
    }
}

/// Resolve a target to an attached element. Never mutates the document.
fn resolve(doc: &Document, target: MountTarget<'_>) -> Result<NodeId> {
    match target {
        MountTarget::Selector(selector) => doc
            .query_selector(selector)
            .ok()
            .flatten()
            .ok_or_else(|| {
                WorkframeError::TargetNotFound(format!(
                    "DOM element matching selector not found: {selector}"
                ))
            }),
        MountTarget::Element(id) if doc.is_element(id) && doc.parent(id).is_some() => Ok(id),
        MountTarget::Element(id) => Err(WorkframeError::TargetNotFound(format!(
            "node {} is not an attached element",
            id.0
        ))),
    }
}

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`]. Dropping it leaves the app mounted: the
/// root stays registered until [`MountHandle::unmount`].
pub struct MountHandle {
    document: Document,
    root: Rc<ComponentInstance>,
}

impl fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl MountHandle {
    pub fn root_component(&self) -> ComponentId {
        self.root.id()
    }

    /// Live root element of the rendered tree.
    pub fn root_element(&self) -> Option<NodeId> {
        self.root.root_element()
    }

    /// Latest committed tree of the root component.
    pub fn tree(&self) -> Option<VNode> {
        self.root.tree()
    }

    /// State of the root component.
    pub fn state(&self) -> StateHandle {
        self.root.state().clone()
    }

    pub fn instance(&self) -> &Rc<ComponentInstance> {
        &self.root
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Remove the rendered tree from the document and detach every
    /// instance in it.
    pub fn unmount(self) -> Result<()> {
        reconciler::unmount_root(&self.root)
    }
}

// =============================================================================
// Mount Functions
// =============================================================================

/// Mount `component` in place of `target`.
///
/// Fails with `TargetNotFound` before touching the document when the
/// target cannot be resolved.
pub fn mount<'a>(
    doc: &Document,
    component: &ComponentType,
    target: impl Into<MountTarget<'a>>,
    initial: Value,
) -> Result<MountHandle> {
    mount_with_children(doc, component, target, initial, Vec::new())
}

/// Mount with slot children for the root's render closure.
pub fn mount_with_children<'a>(
    doc: &Document,
    component: &ComponentType,
    target: impl Into<MountTarget<'a>>,
    initial: Value,
    children: Vec<Node>,
) -> Result<MountHandle> {
    if reconciler::is_rendering() {
        return Err(WorkframeError::InvalidArgument(
            "mount called during a render cycle".to_string(),
        ));
    }
    let target = resolve(doc, target.into())?;
    let initial = state_from(initial)?;

    let factory = get_or_register_factory(component);
    let root = factory.create(
        initial,
        InstanceContext {
            document: doc.clone(),
            depth: 0,
        },
    );
    root.set_slot(children);

    if let Err(err) = reconciler::mount_root(&root, target) {
        root.detach();
        return Err(err);
    }
    retain_root(&root);
    log::debug!("mounted {} as {}", component.name(), root.id());

    Ok(MountHandle {
        document: doc.clone(),
        root,
    })
}

/// Unmount the application.
pub fn unmount(handle: MountHandle) -> Result<()> {
    handle.unmount()
}

// =============================================================================
// Update-by-action
// =============================================================================

/// Pure state transition for [`Dispatcher::dispatch`].
pub type Updater<T> = Box<dyn Fn(&State, &Action<T>) -> State>;

/// Applies actions to the app state and re-renders the root.
///
/// The app state lives in a signal; one effect replaces the root
/// component's state with every new value and re-renders it.
pub struct Dispatcher<T> {
    handle: MountHandle,
    store: Signal<State>,
    updater: Updater<T>,
    failure: Rc<RefCell<Option<WorkframeError>>>,
    stop_effect: Option<Box<dyn FnOnce()>>,
}

impl<T> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<T> Dispatcher<T> {
    /// Apply `action` and re-render. Returns the new app state.
    ///
    /// The root's state is replaced by the updater's result, so fields the
    /// updater drops are gone from the next render.
    pub fn dispatch(&self, action: Action<T>) -> Result<State> {
        let next = (self.updater)(&self.store.get(), &action);
        self.store.set(next.clone());

        if let Some(err) = self.failure.borrow_mut().take() {
            return Err(err);
        }
        Ok(next)
    }

    /// Current app state.
    pub fn state(&self) -> State {
        self.store.get()
    }

    pub fn handle(&self) -> &MountHandle {
        &self.handle
    }
}

impl<T> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }
    }
}

/// Mount with an update function.
///
/// `updater` must be pure: it receives the current app state and an action
/// and returns the next state.
pub fn mount_with_updater<'a, T: 'static>(
    doc: &Document,
    component: &ComponentType,
    target: impl Into<MountTarget<'a>>,
    initial: Value,
    updater: impl Fn(&State, &Action<T>) -> State + 'static,
) -> Result<Dispatcher<T>> {
    let handle = mount(doc, component, target, initial)?;
    let store: Signal<State> = signal(handle.state().snapshot());
    let failure: Rc<RefCell<Option<WorkframeError>>> = Rc::new(RefCell::new(None));

    let root = handle.instance().clone();
    let effect_store = store.clone();
    let effect_failure = failure.clone();
    let stop = effect(move || {
        let state = effect_store.get();
        // Unchanged state (including the effect's first run) renders nothing.
        if !root.replace_state(&state) {
            return;
        }
        log::debug!("dispatch render of {}", root.id());
        if let Err(err) = reconciler::render_component(root.id()) {
            *effect_failure.borrow_mut() = Some(err);
        }
    });

    Ok(Dispatcher {
        handle,
        store,
        updater: Box::new(updater),
        failure,
        stop_effect: Some(Box::new(stop)),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{render, reset_registry};
    use crate::pipeline::scheduler::reset_scheduler;
    use crate::primitives::{element, text, Attrs};
    use serde_json::json;

    fn setup() -> Document {
        reset_registry();
        reset_scheduler();
        let doc = Document::new();
        let app = doc.create_element("div");
        doc.set_attribute(app, "id", "app").unwrap();
        doc.append_child(doc.body(), app).unwrap();
        doc
    }

    fn greeting() -> ComponentType {
        ComponentType::new("Greeting", |_ctx| {
            render(|state, _children| {
                element("h1", Attrs::new(), vec![text(state.get("name").cloned().unwrap_or_default())])
            })
        })
    }

    #[test]
    fn test_missing_selector_is_target_not_found() {
        let doc = setup();
        let before = doc.outer_html(doc.root());

        let err = mount(&doc, &greeting(), "#nope", json!({})).unwrap_err();
        assert!(matches!(err, WorkframeError::TargetNotFound(_)));
        assert!(err.to_string().contains("#nope"));
        assert_eq!(doc.outer_html(doc.root()), before);
    }

    #[test]
    fn test_detached_element_is_target_not_found() {
        let doc = setup();
        let loose = doc.create_element("div");
        let err = mount(&doc, &greeting(), loose, json!({})).unwrap_err();
        assert!(matches!(err, WorkframeError::TargetNotFound(_)));
    }

    #[test]
    fn test_non_object_state_is_invalid() {
        let doc = setup();
        let err = mount(&doc, &greeting(), "#app", json!([1, 2])).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
        assert!(doc.query_selector("#app").unwrap().is_some());
    }

    #[test]
    fn test_mount_substitutes_target() {
        let doc = setup();
        let handle = mount(&doc, &greeting(), "#app", json!({"name": "X"})).unwrap();

        assert!(doc.query_selector("#app").unwrap().is_none());
        let root = handle.root_element().unwrap();
        assert_eq!(doc.parent(root), Some(doc.body()));
        assert_eq!(doc.tag_name(root).as_deref(), Some("h1"));
        assert_eq!(doc.text_content(root), "X");
    }

    #[test]
    fn test_unmount_removes_tree() {
        let doc = setup();
        let handle = mount(&doc, &greeting(), "#app", json!({"name": "X"})).unwrap();
        let root = handle.root_element().unwrap();
        let instance = handle.instance().clone();

        handle.unmount().unwrap();
        assert!(!doc.exists(root));
        assert!(doc.children(doc.body()).is_empty());
        assert_eq!(instance.lifecycle(), crate::types::Lifecycle::Unmounted);
    }
}

//! Reconciler - Render cycles and render-hook notification.
//!
//! # Cycle
//!
//! ```text
//! set() → render_component(id)
//!           ├─ build new tree (render closures)
//!           ├─ patch against the committed tree
//!           │    └─ OwnershipModule records the owner of every node that was
//!           │       created, changed or removed
//!           ├─ commit the patched tree
//!           └─ schedule render actions, deepest owner first
//! ```
//!
//! A `set` that arrives while a cycle runs is queued and rendered right after
//! it, before control returns to the caller.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::engine::{get_instance, ComponentInstance};
use crate::error::{Result, WorkframeError};
use crate::types::{ComponentId, Lifecycle};
use crate::vdom::{
    AttributesModule, ComponentBoundary, EventListenersModule, PatchModule, Patcher, VComponent,
    VNode,
};

use super::scheduler::request_animation_frame;

// =============================================================================
// Cycle State
// =============================================================================

#[derive(Default)]
struct CycleState {
    rendering: bool,
    /// Re-renders requested while a cycle was running.
    pending: VecDeque<ComponentId>,
    /// Owners touched by the current patch, in notification order.
    notified: Vec<Rc<ComponentInstance>>,
    /// Instances attached by the current patch. Their first render actions
    /// are already scheduled with the mount actions.
    attached: HashSet<ComponentId>,
}

thread_local! {
    static CYCLE: RefCell<CycleState> = RefCell::new(CycleState::default());
}

/// True while a render cycle is running.
pub fn is_rendering() -> bool {
    CYCLE.with(|cycle| cycle.borrow().rendering)
}

fn begin_cycle() -> Result<()> {
    CYCLE.with(|cycle| {
        let mut cycle = cycle.borrow_mut();
        if cycle.rendering {
            return Err(WorkframeError::InvalidArgument(
                "cannot start a render cycle from inside another".to_string(),
            ));
        }
        cycle.rendering = true;
        Ok(())
    })
}

fn end_cycle() {
    CYCLE.with(|cycle| *cycle.borrow_mut() = CycleState::default());
}

// =============================================================================
// Ownership Module
// =============================================================================

/// Records the owning component of every node the patch touched.
struct OwnershipModule;

fn notify(vnode: &VNode) {
    let Some(instance) = vnode.owner().and_then(get_instance) else {
        return;
    };
    CYCLE.with(|cycle| cycle.borrow_mut().notified.push(instance));
}

impl PatchModule for OwnershipModule {
    fn create(&mut self, _doc: &Document, vnode: &VNode) -> Result<()> {
        notify(vnode);
        Ok(())
    }

    fn update(&mut self, _doc: &Document, _old: &VNode, new: &VNode, changed: bool) -> Result<()> {
        if changed {
            notify(new);
        }
        Ok(())
    }

    fn remove(&mut self, _doc: &Document, vnode: &VNode) -> Result<()> {
        notify(vnode);
        Ok(())
    }
}

fn patcher() -> Patcher {
    Patcher::new(vec![
        Box::new(AttributesModule),
        Box::new(EventListenersModule),
        Box::new(OwnershipModule),
    ])
}

// =============================================================================
// Entry Points
// =============================================================================

/// Render a root instance in place of `target`.
pub(crate) fn mount_root(instance: &Rc<ComponentInstance>, target: NodeId) -> Result<()> {
    begin_cycle()?;
    log::debug!("mount cycle for {}", instance.id());

    let result = instance
        .render_root()
        .and_then(|tree| patcher().patch(instance.document(), target, tree))
        .map(|tree| {
            instance.commit(&tree);
            drain_notifications();
        })
        .and_then(|()| process_pending());

    end_cycle();
    result
}

/// Re-render one instance with its current state.
///
/// Called from the instance's state container on every `set`.
pub fn render_component(id: ComponentId) -> Result<()> {
    if get_instance(id).is_none() {
        return Err(WorkframeError::InvalidArgument(format!(
            "render requested for unknown component {id}"
        )));
    }
    let queued = CYCLE.with(|cycle| {
        let mut cycle = cycle.borrow_mut();
        if cycle.rendering {
            if !cycle.pending.contains(&id) {
                cycle.pending.push_back(id);
            }
            true
        } else {
            cycle.rendering = true;
            false
        }
    });
    if queued {
        log::debug!("queued re-render of {id}");
        return Ok(());
    }

    let result = render_one(id).and_then(|()| process_pending());
    end_cycle();
    result
}

/// Tear down a mounted root and everything below it.
pub(crate) fn unmount_root(instance: &Rc<ComponentInstance>) -> Result<()> {
    let Some(tree) = instance.tree() else {
        instance.detach();
        return Ok(());
    };
    begin_cycle()?;
    log::debug!("unmount cycle for {}", instance.id());

    let boundary: Rc<dyn ComponentBoundary> = instance.clone();
    let result = patcher()
        .remove(
            instance.document(),
            VNode::Component(VComponent {
                boundary,
                root: Box::new(tree),
            }),
        )
        .map(|()| drain_notifications());

    end_cycle();
    result
}

fn process_pending() -> Result<()> {
    while let Some(id) = CYCLE.with(|cycle| cycle.borrow_mut().pending.pop_front()) {
        render_one(id)?;
    }
    Ok(())
}

fn render_one(id: ComponentId) -> Result<()> {
    // Queued instances may be detached by an earlier render of the cycle.
    let Some(instance) = get_instance(id) else {
        log::debug!("skipped re-render of released {id}");
        return Ok(());
    };
    if instance.lifecycle() == Lifecycle::Unmounted {
        return Ok(());
    }
    // Not rendered yet: the mount (or the parent's patch) will render it.
    let Some(old) = instance.tree() else {
        return Ok(());
    };

    log::debug!("render cycle for {} {id}", instance.component().name());
    let tree = instance.render_root()?;
    let tree = patcher().patch(instance.document(), old, tree)?;
    instance.commit(&tree);
    drain_notifications();
    Ok(())
}

// =============================================================================
// Hook Scheduling
// =============================================================================

/// Insert hook of an instance's mount marker.
///
/// The first attachment schedules the mount actions, then the render actions.
pub(crate) fn component_attached(instance: &Rc<ComponentInstance>) {
    if !instance.mark_attached() {
        return;
    }
    CYCLE.with(|cycle| cycle.borrow_mut().attached.insert(instance.id()));
    log::trace!("{} attached", instance.id());

    let mount = instance.clone();
    request_animation_frame(move || {
        if mount.lifecycle() != Lifecycle::Mounted {
            return Ok(());
        }
        mount.run_on_mount_actions()
    });
    let render = instance.clone();
    request_animation_frame(move || {
        if render.lifecycle() != Lifecycle::Mounted {
            return Ok(());
        }
        render.run_on_render_actions()
    });
}

/// Schedule the render actions of every owner the last patch touched, once
/// each, deepest first and later siblings before earlier ones.
fn drain_notifications() {
    let (mut notified, attached) = CYCLE.with(|cycle| {
        let mut cycle = cycle.borrow_mut();
        (
            std::mem::take(&mut cycle.notified),
            std::mem::take(&mut cycle.attached),
        )
    });

    let mut seen = HashSet::new();
    notified.retain(|instance| !attached.contains(&instance.id()) && seen.insert(instance.id()));
    // Reverse tree order, then deepest first. The sort is stable.
    notified.reverse();
    notified.sort_by(|a, b| b.depth().cmp(&a.depth()));

    for instance in notified {
        log::trace!("render actions of {} scheduled", instance.id());
        request_animation_frame(move || instance.run_on_render_actions());
    }
}

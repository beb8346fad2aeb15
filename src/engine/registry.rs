//! Component Registry - Factories and live instances.
//!
//! - One factory per [`ComponentType`], created on first use and kept for
//!   the life of the thread
//! - Instance ids allocated monotonically
//! - A weak id → instance map so patch modules can resolve node owners
//! - Strong references to mounted roots, held until they are unmounted

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{ComponentId, ComponentTypeId};

use super::component::{ComponentFactory, ComponentInstance, ComponentType};

// =============================================================================
// Registry State
// =============================================================================

/// Type ids are process-wide: a `ComponentType` may be created on one
/// thread's test and looked up after a registry reset.
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Factory per component type.
    static FACTORIES: RefCell<HashMap<ComponentTypeId, Rc<ComponentFactory>>> = RefCell::new(HashMap::new());

    /// Live instances by id. Weak so that dropping a tree frees its instances.
    static INSTANCES: RefCell<HashMap<ComponentId, Weak<ComponentInstance>>> = RefCell::new(HashMap::new());

    /// Mounted root instances. Nothing else keeps a root alive once the
    /// caller drops its handle.
    static ROOTS: RefCell<HashMap<ComponentId, Rc<ComponentInstance>>> = RefCell::new(HashMap::new());

    /// Next instance id.
    static NEXT_INSTANCE_ID: Cell<u64> = const { Cell::new(1) };
}

pub(crate) fn allocate_type_id() -> ComponentTypeId {
    ComponentTypeId(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
}

// =============================================================================
// Factories
// =============================================================================

/// Get the factory for a component type, creating it on first use.
///
/// Repeated lookups return the same factory, so a parent re-render never
/// re-registers its children's types.
pub fn get_or_register_factory(component: &ComponentType) -> Rc<ComponentFactory> {
    FACTORIES.with(|factories| {
        factories
            .borrow_mut()
            .entry(component.id())
            .or_insert_with(|| {
                log::debug!("registered component type {}", component.name());
                Rc::new(ComponentFactory::new(component.clone()))
            })
            .clone()
    })
}

/// Number of registered factories.
pub fn factory_count() -> usize {
    FACTORIES.with(|factories| factories.borrow().len())
}

// =============================================================================
// Instances
// =============================================================================

/// Allocate an id for a new instance.
pub fn allocate_component_id() -> ComponentId {
    NEXT_INSTANCE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ComponentId(id)
    })
}

pub fn register_instance(instance: &Rc<ComponentInstance>) {
    INSTANCES.with(|instances| {
        instances
            .borrow_mut()
            .insert(instance.id(), Rc::downgrade(instance));
    });
}

pub fn release_instance(id: ComponentId) {
    INSTANCES.with(|instances| {
        instances.borrow_mut().remove(&id);
    });
}

/// Resolve a live instance.
pub fn get_instance(id: ComponentId) -> Option<Rc<ComponentInstance>> {
    INSTANCES.with(|instances| instances.borrow().get(&id).and_then(Weak::upgrade))
}

/// Number of live registered instances.
pub fn instance_count() -> usize {
    INSTANCES.with(|instances| {
        instances
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    })
}

// =============================================================================
// Mounted Roots
// =============================================================================

/// Keep a mounted root alive until [`release_root`].
pub(crate) fn retain_root(instance: &Rc<ComponentInstance>) {
    ROOTS.with(|roots| {
        roots.borrow_mut().insert(instance.id(), instance.clone());
    });
}

/// Drop the strong reference held for a root. No-op for other instances.
pub(crate) fn release_root(id: ComponentId) {
    let released = ROOTS.with(|roots| roots.borrow_mut().remove(&id));
    // Dropped outside the borrow.
    drop(released);
}

/// Number of mounted roots.
pub fn root_count() -> usize {
    ROOTS.with(|roots| roots.borrow().len())
}

/// Reset all registry state (for testing).
pub fn reset_registry() {
    let roots: Vec<_> = ROOTS.with(|roots| roots.borrow_mut().drain().map(|(_, root)| root).collect());
    drop(roots);
    FACTORIES.with(|factories| factories.borrow_mut().clear());
    INSTANCES.with(|instances| instances.borrow_mut().clear());
    NEXT_INSTANCE_ID.with(|next| next.set(1));
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::engine::{render, InstanceContext};
    use crate::primitives::text;
    use crate::types::State;

    fn setup() {
        reset_registry();
    }

    fn plain(name: &str) -> ComponentType {
        ComponentType::new(name, |_ctx| render(|_state, _children| Ok(text("x"))))
    }

    #[test]
    fn test_factory_is_memoized() {
        setup();
        let a = plain("A");
        let b = plain("B");

        let first = get_or_register_factory(&a);
        let second = get_or_register_factory(&a.clone());
        assert!(Rc::ptr_eq(&first, &second));

        get_or_register_factory(&b);
        assert_eq!(factory_count(), 2);
    }

    #[test]
    fn test_instance_ids_are_monotonic() {
        setup();
        let first = allocate_component_id();
        let second = allocate_component_id();
        assert!(second > first);
    }

    #[test]
    fn test_instances_resolve_until_released() {
        setup();
        let factory = get_or_register_factory(&plain("A"));
        let instance = factory.create(
            State::new(),
            InstanceContext {
                document: Document::new(),
                depth: 0,
            },
        );
        let id = instance.id();

        assert!(get_instance(id).is_some());
        assert_eq!(instance_count(), 1);

        release_instance(id);
        assert!(get_instance(id).is_none());
    }

    #[test]
    fn test_dropped_instances_do_not_resolve() {
        setup();
        let factory = get_or_register_factory(&plain("A"));
        let id = factory
            .create(
                State::new(),
                InstanceContext {
                    document: Document::new(),
                    depth: 0,
                },
            )
            .id();
        assert!(get_instance(id).is_none());
        assert_eq!(instance_count(), 0);
    }
}

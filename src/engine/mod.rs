//! Engine - Component types, factories, instances and tree building.
//!
//! The engine manages the component side of rendering:
//! - Registry: one factory per component type, live instances by id
//! - Component: setup → render closure, hook runners, lifecycle
//! - Builder: render output → ownership-annotated virtual tree
//!
//! # Identity
//!
//! ```text
//! ComponentType ──(registry)──→ ComponentFactory ──create()──→ ComponentInstance
//!   (handle, cloned freely)       (one per type)                 (one per mount site)
//! ```
//!
//! A parent re-render re-invokes the render closures of its nested
//! instances. Setup only runs when a mount site appears for the first time.

mod builder;
mod component;
mod registry;

pub use builder::MOUNT_MARKER_KEY;
pub use component::{
    define, render, ComponentFactory, ComponentInstance, ComponentType, InstanceContext, RenderFn,
};
pub use registry::*;
pub(crate) use registry::retain_root;

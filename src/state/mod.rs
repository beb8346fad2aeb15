//! State Module - Component-local state and lifecycle hooks.
//!
//! - **Container** - Field reads, single and batch updates, functional updates
//! - **Hooks** - Mount/render actions declared through a setup context

mod container;
mod hooks;

pub use container::{Patch, SetTarget, StateHandle, Update};
pub(crate) use container::ChangeHook;
pub use hooks::{HookAction, HookCollection, SetupContext};

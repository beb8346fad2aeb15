//! Lifecycle hooks - Mount and render actions declared during setup.
//!
//! A setup function receives its own [`SetupContext`] and declares hooks on
//! it. The factory drains the context right after setup returns, so hooks
//! can only ever reach the instance whose setup declared them.

use std::fmt;

use crate::types::State;

use super::container::StateHandle;

/// A lifecycle action. Receives the instance's current state.
pub type HookAction = Box<dyn FnMut(&State) -> anyhow::Result<()>>;

// =============================================================================
// Hook Collection
// =============================================================================

/// Ordered mount and render actions staged for one instance.
#[derive(Default)]
pub struct HookCollection {
    mount: Vec<HookAction>,
    render: Vec<HookAction>,
}

impl fmt::Debug for HookCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCollection")
            .field("mount", &self.mount.len())
            .field("render", &self.render.len())
            .finish()
    }
}

impl HookCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mount(&mut self, action: impl FnMut(&State) -> anyhow::Result<()> + 'static) {
        self.mount.push(Box::new(action));
    }

    pub fn on_render(&mut self, action: impl FnMut(&State) -> anyhow::Result<()> + 'static) {
        self.render.push(Box::new(action));
    }

    /// Take every staged mount action, leaving the sequence empty.
    pub fn consume_mount_actions(&mut self) -> Vec<HookAction> {
        std::mem::take(&mut self.mount)
    }

    /// Take every staged render action, leaving the sequence empty.
    pub fn consume_render_actions(&mut self) -> Vec<HookAction> {
        std::mem::take(&mut self.render)
    }

    pub fn mount_count(&self) -> usize {
        self.mount.len()
    }

    pub fn render_count(&self) -> usize {
        self.render.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mount.is_empty() && self.render.is_empty()
    }
}

// =============================================================================
// Setup Context
// =============================================================================

/// Passed to a component's setup function.
///
/// ```ignore
/// let counter = ComponentType::new("Counter", |ctx| {
///     let state = ctx.state().clone();
///     ctx.on_mount(|s| { log::info!("mounted with {s:?}"); Ok(()) });
///     render(move |s, _children| element("p", Attrs::new(), vec![text(s["count"].clone())]))
/// });
/// ```
pub struct SetupContext {
    state: StateHandle,
    hooks: HookCollection,
}

impl fmt::Debug for SetupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupContext")
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl SetupContext {
    pub(crate) fn new(state: StateHandle) -> Self {
        Self {
            state,
            hooks: HookCollection::new(),
        }
    }

    /// State of the instance under construction. Clone it into closures
    /// that update state later.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// State the instance is being constructed with.
    pub fn initial_state(&self) -> State {
        self.state.initial().clone()
    }

    /// Run `action` once, when the instance first enters the document.
    pub fn on_mount(&mut self, action: impl FnMut(&State) -> anyhow::Result<()> + 'static) {
        self.hooks.on_mount(action);
    }

    /// Run `action` after every patch that changed the instance's subtree.
    pub fn on_render(&mut self, action: impl FnMut(&State) -> anyhow::Result<()> + 'static) {
        self.hooks.on_render(action);
    }

    pub(crate) fn into_hooks(self) -> HookCollection {
        self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_empties_sequences() {
        let mut hooks = HookCollection::new();
        hooks.on_mount(|_| Ok(()));
        hooks.on_render(|_| Ok(()));
        hooks.on_render(|_| Ok(()));

        assert_eq!(hooks.consume_mount_actions().len(), 1);
        assert_eq!(hooks.consume_render_actions().len(), 2);
        assert!(hooks.is_empty());
        assert!(hooks.consume_render_actions().is_empty());
    }

    #[test]
    fn test_contexts_keep_hooks_apart() {
        let mut a = SetupContext::new(StateHandle::new(State::new()));
        let mut b = SetupContext::new(StateHandle::new(State::new()));
        a.on_mount(|_| Ok(()));
        b.on_mount(|_| Ok(()));
        b.on_render(|_| Ok(()));

        let a = a.into_hooks();
        let b = b.into_hooks();
        assert_eq!((a.mount_count(), a.render_count()), (1, 0));
        assert_eq!((b.mount_count(), b.render_count()), (1, 1));
    }
}

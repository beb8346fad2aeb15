//! Core types for workframe.
//!
//! These types flow through every layer: component identity, lifecycle
//! state, state values and the action envelope used by the update channel.

use std::fmt;

pub use serde_json::{json, Value};

use crate::error::{Result, WorkframeError};

// =============================================================================
// State
// =============================================================================

/// Component state: insertion-ordered named fields holding arbitrary values.
pub type State = serde_json::Map<String, Value>;

/// Convert a value into a [`State`].
///
/// Objects become the state as-is and `null` is the empty state. Anything
/// else is an `InvalidArgument`.
pub fn state_from(value: Value) -> Result<State> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(State::new()),
        other => Err(WorkframeError::InvalidArgument(format!(
            "state must be an object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Short name of a value's JSON kind, used in error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Identity of one live component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Identity of a registered component type (one per [`ComponentType`] handle).
///
/// [`ComponentType`]: crate::engine::ComponentType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

// =============================================================================
// Lifecycle
// =============================================================================

/// Per-instance lifecycle: `Unattached → Mounted → Unmounted`.
///
/// Re-renders keep an instance in `Mounted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Built, but its mount marker has not entered the document yet.
    #[default]
    Unattached,
    /// Its mount marker entered the document.
    Mounted,
    /// Removed from the tree. Never re-attached.
    Unmounted,
}

// =============================================================================
// Action
// =============================================================================

/// Message for the update-by-action channel.
///
/// `kind` plays the role of an action type tag; `data` is an optional payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Action<T> {
    pub kind: T,
    pub data: Option<Value>,
}

impl<T> Action<T> {
    /// Action without payload.
    pub fn new(kind: T) -> Self {
        Self { kind, data: None }
    }

    /// Action carrying a payload.
    pub fn with_data(kind: T, data: impl Into<Value>) -> Self {
        Self {
            kind,
            data: Some(data.into()),
        }
    }
}

// =============================================================================
// Event Directives (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Directives parsed from the `:`-delimited suffix of a handler key,
    /// e.g. `onClick:default` or `onSubmit:prevent:stop`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Directives: u8 {
        const NONE = 0;
        /// Keep the browser default action for designated tag/event pairs.
        const DEFAULT = 1 << 0;
        /// Always suppress the default action.
        const PREVENT = 1 << 1;
        /// Stop propagation after the handler runs.
        const STOP = 1 << 2;
    }
}

impl Directives {
    /// Parse a single directive name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::DEFAULT),
            "prevent" => Some(Self::PREVENT),
            "stop" => Some(Self::STOP),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! DOM events and listeners.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::NodeId;

/// Event handler. Receives the event mutably so it can prevent the default
/// action or stop propagation.
pub type EventHandler = Rc<dyn Fn(&mut Event)>;

/// A listener attached to an element.
#[derive(Clone)]
pub struct Listener {
    /// Lower-cased event name (`click`, `submit`, ...).
    pub event: String,
    pub handler: EventHandler,
}

impl Listener {
    pub fn new(event: impl Into<String>, handler: EventHandler) -> Self {
        Self {
            event: event.into(),
            handler,
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("event", &self.event).finish_non_exhaustive()
    }
}

/// An event travelling from its target up to the document root.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name, lower-cased.
    pub kind: String,
    /// Node the event was dispatched on. Set by `dispatch_event`.
    pub target: Option<NodeId>,
    /// Node whose listeners are currently running.
    pub current_target: Option<NodeId>,
    /// Free-form payload (input value, key, ...).
    pub detail: Value,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_lowercase(),
            target: None,
            current_target: None,
            detail: Value::Null,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn with_detail(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            detail: detail.into(),
            ..Self::new(kind)
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

//! State Container - One component instance's data.
//!
//! Reads are plain lookups. Every successful `set` applies its updates in
//! order and then triggers exactly one re-render of the owning instance.
//! Before the instance is bound (during setup) updates only mutate.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, WorkframeError};
use crate::types::{kind_of, State, Value};

// =============================================================================
// Update Types
// =============================================================================

/// New value for one field: a value, or a function of the current value.
pub enum Update {
    Value(Value),
    With(Box<dyn FnOnce(&Value) -> Value>),
}

impl Update {
    /// Functional update. Receives the current value (`null` when unset).
    pub fn with(f: impl FnOnce(&Value) -> Value + 'static) -> Self {
        Update::With(Box::new(f))
    }

    fn apply(self, current: &Value) -> Value {
        match self {
            Update::Value(value) => value,
            Update::With(f) => f(current),
        }
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Update::With(_) => f.write_str("With(..)"),
        }
    }
}

impl From<Value> for Update {
    fn from(value: Value) -> Self {
        Update::Value(value)
    }
}

impl From<&str> for Update {
    fn from(value: &str) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<String> for Update {
    fn from(value: String) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<bool> for Update {
    fn from(value: bool) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<i32> for Update {
    fn from(value: i32) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<i64> for Update {
    fn from(value: i64) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<u64> for Update {
    fn from(value: u64) -> Self {
        Update::Value(Value::from(value))
    }
}

impl From<f64> for Update {
    fn from(value: f64) -> Self {
        Update::Value(Value::from(value))
    }
}

/// Ordered batch of field updates.
#[derive(Debug, Default)]
pub struct Patch {
    entries: Vec<(String, Update)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, update: impl Into<Update>) -> Self {
        self.entries.push((name.into(), update.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<State> for Patch {
    fn from(state: State) -> Self {
        Self {
            entries: state
                .into_iter()
                .map(|(name, value)| (name, Update::Value(value)))
                .collect(),
        }
    }
}

/// First argument of [`StateHandle::set`]: a field name or a batch.
#[derive(Debug)]
pub enum SetTarget {
    Field(String),
    /// A string names a field, an object is a batch. Anything else is
    /// rejected.
    Value(Value),
    Patch(Patch),
}

impl From<&str> for SetTarget {
    fn from(name: &str) -> Self {
        SetTarget::Field(name.to_string())
    }
}

impl From<String> for SetTarget {
    fn from(name: String) -> Self {
        SetTarget::Field(name)
    }
}

impl From<Value> for SetTarget {
    fn from(value: Value) -> Self {
        SetTarget::Value(value)
    }
}

impl From<Patch> for SetTarget {
    fn from(patch: Patch) -> Self {
        SetTarget::Patch(patch)
    }
}

impl From<State> for SetTarget {
    fn from(state: State) -> Self {
        SetTarget::Patch(Patch::from(state))
    }
}

// =============================================================================
// State Container
// =============================================================================

/// Re-render callback installed once the instance exists.
pub(crate) type ChangeHook = Rc<dyn Fn() -> Result<()>>;

struct StateContainer {
    data: RefCell<State>,
    initial: State,
    on_change: RefCell<Option<ChangeHook>>,
}

/// Shared handle to a component's state. Clones refer to the same state.
#[derive(Clone)]
pub struct StateHandle {
    inner: Rc<StateContainer>,
}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("data", &self.inner.data.borrow())
            .field("bound", &self.inner.on_change.borrow().is_some())
            .finish()
    }
}

impl StateHandle {
    pub fn new(initial: State) -> Self {
        Self {
            inner: Rc::new(StateContainer {
                data: RefCell::new(initial.clone()),
                initial,
                on_change: RefCell::new(None),
            }),
        }
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.data.borrow().get(name).cloned()
    }

    /// Copy of the whole current state.
    pub fn snapshot(&self) -> State {
        self.inner.data.borrow().clone()
    }

    /// State the container was constructed with.
    pub fn initial(&self) -> &State {
        &self.inner.initial
    }

    /// Update state and re-render once.
    ///
    /// - `set("name", Some(update))` sets one field (`None` sets it to null);
    /// - `set(batch, None)` applies each entry in order.
    ///
    /// A batch together with a value is an `InvalidArgument` and leaves the
    /// state untouched, as is a target that is neither a name nor a batch.
    pub fn set(&self, target: impl Into<SetTarget>, value: Option<Update>) -> Result<()> {
        let entries = match target.into() {
            SetTarget::Field(name) | SetTarget::Value(Value::String(name)) => {
                vec![(name, value.unwrap_or(Update::Value(Value::Null)))]
            }
            SetTarget::Value(Value::Object(map)) => {
                reject_value(&value)?;
                Patch::from(map).entries
            }
            SetTarget::Patch(patch) => {
                reject_value(&value)?;
                patch.entries
            }
            SetTarget::Value(other) => {
                return Err(WorkframeError::InvalidArgument(format!(
                    "state key must be a field name or an object, got {}",
                    kind_of(&other)
                )));
            }
        };
        self.apply(entries)
    }

    /// Single-field form.
    pub fn set_field(&self, name: impl Into<String>, update: impl Into<Update>) -> Result<()> {
        self.apply(vec![(name.into(), update.into())])
    }

    /// Batch form.
    pub fn set_many(&self, patch: impl Into<Patch>) -> Result<()> {
        self.apply(patch.into().entries)
    }

    /// Re-apply the construction-time state as one batch.
    pub fn reset(&self) -> Result<()> {
        self.set_many(Patch::from(self.inner.initial.clone()))
    }

    fn apply(&self, entries: Vec<(String, Update)>) -> Result<()> {
        for (name, update) in entries {
            let current = self.get(&name).unwrap_or(Value::Null);
            let next = update.apply(&current);
            self.inner.data.borrow_mut().insert(name, next);
        }

        let hook = self.inner.on_change.borrow().clone();
        match hook {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Engine Plumbing
    // -------------------------------------------------------------------------

    pub(crate) fn bind(&self, hook: ChangeHook) {
        *self.inner.on_change.borrow_mut() = Some(hook);
    }

    pub(crate) fn unbind(&self) {
        self.inner.on_change.borrow_mut().take();
    }

    /// Merge fields without re-rendering. Returns true if anything changed.
    pub(crate) fn merge_silently(&self, fields: &State) -> bool {
        let mut data = self.inner.data.borrow_mut();
        let mut changed = false;
        for (name, value) in fields {
            if data.get(name) != Some(value) {
                data.insert(name.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    /// Replace the whole state without re-rendering. Returns true if it
    /// differed.
    pub(crate) fn replace_silently(&self, state: &State) -> bool {
        let mut data = self.inner.data.borrow_mut();
        if *data == *state {
            return false;
        }
        *data = state.clone();
        true
    }
}

fn reject_value(value: &Option<Update>) -> Result<()> {
    match value {
        Some(_) => Err(WorkframeError::InvalidArgument(
            "value can't be passed when setting state from an object".to_string(),
        )),
        None => Ok(()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::state_from;
    use serde_json::json;
    use std::cell::Cell;

    fn handle(value: Value) -> StateHandle {
        StateHandle::new(state_from(value).unwrap())
    }

    fn counting(state: &StateHandle) -> Rc<Cell<usize>> {
        let renders = Rc::new(Cell::new(0));
        let counter = renders.clone();
        state.bind(Rc::new(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }));
        renders
    }

    #[test]
    fn test_functional_update() {
        let state = handle(json!({"count": 5}));
        state
            .set(
                "count",
                Some(Update::with(|c| json!(c.as_i64().unwrap_or(0) + 1))),
            )
            .unwrap();
        assert_eq!(state.get("count"), Some(json!(6)));
    }

    #[test]
    fn test_functional_update_of_missing_field_sees_null() {
        let state = handle(json!({}));
        state
            .set_field("seen", Update::with(|c| json!(c.is_null())))
            .unwrap();
        assert_eq!(state.get("seen"), Some(json!(true)));
    }

    #[test]
    fn test_batch_matches_single_sets() {
        let batch = handle(json!({"a": 0, "b": 0}));
        batch.set(json!({"a": 1, "b": 2}), None).unwrap();

        let single = handle(json!({"a": 0, "b": 0}));
        single.set("a", Some(1.into())).unwrap();
        single.set("b", Some(2.into())).unwrap();

        assert_eq!(batch.snapshot(), single.snapshot());
    }

    #[test]
    fn test_batch_applies_in_order_with_functions() {
        let state = handle(json!({"n": 1}));
        state
            .set_many(
                Patch::new()
                    .set("n", 10)
                    .set("n", Update::with(|n| json!(n.as_i64().unwrap_or(0) * 2))),
            )
            .unwrap();
        assert_eq!(state.get("n"), Some(json!(20)));
    }

    #[test]
    fn test_object_with_value_is_invalid_and_unchanged() {
        let state = handle(json!({"a": 1}));
        let renders = counting(&state);

        let err = state
            .set(json!({"foo": 1}), Some(json!({"bar": 2}).into()))
            .unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
        assert_eq!(state.snapshot(), state_from(json!({"a": 1})).unwrap());
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn test_non_string_key_is_invalid() {
        let state = handle(json!({}));
        let err = state.set(json!(42), Some(1.into())).unwrap_err();
        assert!(matches!(err, WorkframeError::InvalidArgument(_)));
    }

    #[test]
    fn test_each_set_renders_once() {
        let state = handle(json!({"a": 0}));
        let renders = counting(&state);

        state.set_field("a", 1).unwrap();
        state.set(json!({"a": 2, "b": 3}), None).unwrap();
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_unbound_set_only_mutates() {
        let state = handle(json!({"a": 0}));
        state.set_field("a", 1).unwrap();
        assert_eq!(state.get("a"), Some(json!(1)));
    }

    #[test]
    fn test_reset_restores_initial() {
        let state = handle(json!({"a": 1, "b": "x"}));
        let renders = counting(&state);
        state.set(json!({"a": 9, "b": "y"}), None).unwrap();

        state.reset().unwrap();
        assert_eq!(state.snapshot(), *state.initial());
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn test_merge_silently_reports_changes() {
        let state = handle(json!({"a": 1}));
        let renders = counting(&state);

        assert!(!state.merge_silently(&state_from(json!({"a": 1})).unwrap()));
        assert!(state.merge_silently(&state_from(json!({"a": 2, "b": 3})).unwrap()));
        assert_eq!(state.get("b"), Some(json!(3)));
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn test_replace_silently_drops_missing_fields() {
        let state = handle(json!({"a": 1, "b": 2}));
        let renders = counting(&state);

        assert!(!state.replace_silently(&state_from(json!({"a": 1, "b": 2})).unwrap()));
        assert!(state.replace_silently(&state_from(json!({"c": 3})).unwrap()));
        assert_eq!(state.snapshot(), state_from(json!({"c": 3})).unwrap());
        assert_eq!(renders.get(), 0);
    }
}

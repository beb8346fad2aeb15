//! DOM - In-memory document, events and selectors.
//!
//! The document is the render target for every mounted component. It is a
//! plain node arena with just enough of the browser surface for the patcher
//! and for tests: tree mutation, attributes, listeners with bubbling, and
//! simple selector queries.

mod document;
mod event;
mod selector;

pub use document::{Document, NodeId, NodeKind};
pub use event::{Event, EventHandler, Listener};
pub use selector::Selector;

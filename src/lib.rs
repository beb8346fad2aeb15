//! # workframe
//!
//! Minimal reactive UI component framework.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! update-by-action convenience.
//!
//! ## Architecture
//!
//! A component is a setup function that runs once per instance and returns a
//! render closure. Each instance owns its state; every `set` re-renders that
//! instance alone, patches the document and queues render hooks for the
//! components whose nodes actually changed.
//!
//! ```text
//! mount() → Registry → Factory → Instance → render → Patcher → Document
//!                                    ↑                   │
//!                                  set()        Scheduler::tick() → hooks
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use workframe::{define, element, json, mount, render, scheduler, text, Attrs, Document};
//!
//! let counter = define("Counter", |ctx| {
//!     let state = ctx.state().clone();
//!     ctx.on_render(|state| {
//!         log::info!("count is {}", state["count"]);
//!         Ok(())
//!     });
//!     render(move |current, _children| {
//!         let state = state.clone();
//!         element(
//!             "button",
//!             Attrs::new().on("onClick", move |_| {
//!                 let bumped = workframe::Update::with(|n| json!(n.as_i64().unwrap_or(0) + 1));
//!                 if let Err(err) = state.set_field("count", bumped) {
//!                     log::warn!("click failed: {err}");
//!                 }
//!             }),
//!             vec![text(current["count"].clone())],
//!         )
//!     })
//! });
//!
//! let doc = Document::new();
//! let app = doc.create_element("div");
//! doc.set_attribute(app, "id", "app")?;
//! doc.append_child(doc.body(), app)?;
//!
//! let handle = mount(&doc, &counter, "#app", json!({"count": 0}))?;
//! scheduler::tick()?;
//! ```
//!
//! ## Modules
//!
//! - [`dom`] - In-memory document, events, selectors
//! - [`vdom`] - Virtual nodes and the patcher
//! - [`primitives`] - Node construction (`create_node`, `element`, `component`)
//! - [`state`] - State containers and setup hooks
//! - [`engine`] - Component types, factories, instances
//! - [`pipeline`] - Mount, reconciliation, frame scheduler
//! - `serve` - Dev server (feature `serve`)

pub mod dom;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod state;
pub mod types;
pub mod vdom;

#[cfg(feature = "serve")]
pub mod serve;

// Re-export commonly used items
pub use types::*;

pub use error::{FrameError, Result, WorkframeError};

pub use dom::{Document, Event, NodeId};

pub use engine::{define, render, reset_registry, ComponentInstance, ComponentType, RenderFn};

pub use pipeline::{
    mount, mount_with_children, mount_with_updater, scheduler, unmount, Dispatcher, MountHandle,
    MountTarget,
};

pub use primitives::{component, create_node, element, fragment, text, Attrs, Node, Tag};

pub use state::{Patch, SetTarget, SetupContext, StateHandle, Update};

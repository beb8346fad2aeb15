//! Virtual DOM - Virtual nodes and the patcher that applies them.
//!
//! ```text
//! VNode tree (built per render) → Patcher::patch → Document mutations
//!                                      │
//!                                      └→ PatchModule callbacks (create/update/remove/destroy)
//! ```

mod modules;
mod node;
mod patch;

pub use modules::{AttributesModule, EventListenersModule, PatchModule};
pub use node::{ComponentBoundary, InsertHook, NodeHooks, VComment, VComponent, VElement, VNode, VText};
pub use patch::{PatchTarget, Patcher};

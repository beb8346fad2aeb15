//! Primitives - Node descriptions returned by render closures.
//!
//! # Example
//!
//! ```ignore
//! use workframe::primitives::{element, text, Attrs};
//!
//! let node = element(
//!     "button",
//!     Attrs::new().attr("class", "primary").on("onClick", |_| println!("clicked")),
//!     vec![text("Go")],
//! )?;
//! ```
//!
//! `create_node` is the single construction entry point: a tag name builds an
//! element, a [`ComponentType`](crate::engine::ComponentType) builds a nested
//! component.

mod create_node;
mod types;

pub use create_node::{component, create_node, element, fragment, text, Tag};
pub use types::{Attrs, ComponentNode, ElementNode, Handler, Node, Prop};
pub(crate) use types::display_value;

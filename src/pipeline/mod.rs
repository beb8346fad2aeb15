//! Render Pipeline
//!
//! This module connects component state to document mutations and hook
//! execution.
//!
//! # Pipeline Architecture
//!
//! ```text
//! set() → reconciler (build → patch → commit) → scheduler queue → tick() → hooks
//! ```
//!
//! ## Data Flow
//!
//! 1. **mount** - Resolves the target, creates the root instance, runs the
//!    first cycle
//! 2. **reconciler** - One synchronous cycle per `set`, collecting the owners
//!    of every node the patch touched
//! 3. **scheduler** - Defers mount/render actions to the next frame tick
//!
//! ## Key Design Principles
//!
//! - **Synchronous Mutation**: the document is up to date when `set` returns
//! - **Deferred Side Effects**: hooks only run from `tick()`, after mutation
//! - **Nearest Owner**: only the component owning a changed node is notified

pub mod mount;
pub mod reconciler;
pub mod scheduler;

// Re-exports
pub use mount::{
    mount, mount_with_children, mount_with_updater, unmount, Dispatcher, MountHandle,
    MountTarget, Updater,
};
pub use reconciler::{is_rendering, render_component};
pub use scheduler::{
    frame_count, pending_jobs, request_animation_frame, reset_scheduler, run_until_idle, tick,
    FrameJob,
};

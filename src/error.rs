//! Error types.
//!
//! Every error is surfaced synchronously to the caller of the operation that
//! detected it. Hook failures are the exception: they surface from the frame
//! tick that ran them, as a [`FrameError`].

use thiserror::Error;

/// Errors raised by mounting, state updates, node construction and patching.
#[derive(Debug, Error)]
pub enum WorkframeError {
    /// The mount target could not be resolved. Nothing was mutated.
    #[error("mount target not found: {0}")]
    TargetNotFound(String),

    /// Malformed call shape (state update, component props, directives).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A non-function value was supplied where an event handler was expected.
    #[error("expected function for event handler: {0}")]
    HandlerTypeError(String),

    /// A document operation referenced a missing node or an illegal move.
    #[error("document error: {0}")]
    Document(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WorkframeError>;

/// Failures of hooks run during one frame tick.
///
/// All jobs queued for the frame ran; each failure is collected here.
#[derive(Debug, Error)]
#[error("{} hook failure(s) in frame {frame}", .failures.len())]
pub struct FrameError {
    /// Sequence number of the tick that produced the failures.
    pub frame: u64,
    /// One entry per failed job, in queue order.
    pub failures: Vec<anyhow::Error>,
}

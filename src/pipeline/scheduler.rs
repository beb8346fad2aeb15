//! Scheduler - Defers hook execution to the next animation frame.
//!
//! The host's animation frame is a call to [`tick`]. Each tick runs the jobs
//! that were queued before it started, oldest first. Jobs queued while the
//! tick runs wait for the next one.
//!
//! ```ignore
//! state.set_field("count", 1)?;   // patches the document, queues hooks
//! scheduler::tick()?;             // hooks run, document already updated
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::error::FrameError;

/// A deferred callback.
pub type FrameJob = Box<dyn FnOnce() -> anyhow::Result<()>>;

thread_local! {
    static FRAME_QUEUE: RefCell<VecDeque<FrameJob>> = RefCell::new(VecDeque::new());
    static FRAME_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// Queue a job for the next frame. Queued jobs cannot be cancelled.
pub fn request_animation_frame(job: impl FnOnce() -> anyhow::Result<()> + 'static) {
    FRAME_QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(job)));
}

/// Number of jobs waiting for a frame.
pub fn pending_jobs() -> usize {
    FRAME_QUEUE.with(|queue| queue.borrow().len())
}

/// Number of frames ticked so far.
pub fn frame_count() -> u64 {
    FRAME_COUNT.with(Cell::get)
}

/// Run one frame.
///
/// Every job queued before the call runs, even when earlier ones fail.
/// Returns the number of jobs run, or every failure of the frame.
pub fn tick() -> Result<usize, FrameError> {
    let jobs: Vec<FrameJob> = FRAME_QUEUE.with(|queue| queue.borrow_mut().drain(..).collect());
    let frame = FRAME_COUNT.with(|count| {
        count.set(count.get() + 1);
        count.get()
    });

    let ran = jobs.len();
    let mut failures = Vec::new();
    for job in jobs {
        if let Err(err) = job() {
            log::warn!("hook failed in frame {frame}: {err:#}");
            failures.push(err);
        }
    }

    if failures.is_empty() {
        Ok(ran)
    } else {
        Err(FrameError { frame, failures })
    }
}

/// Tick until no jobs are left or `max_frames` frames ran.
///
/// Stops at the first frame with failures. Returns the frames ticked.
pub fn run_until_idle(max_frames: usize) -> Result<usize, FrameError> {
    let mut frames = 0;
    while frames < max_frames && pending_jobs() > 0 {
        tick()?;
        frames += 1;
    }
    Ok(frames)
}

/// Drop all queued jobs and reset the frame counter (for testing).
pub fn reset_scheduler() {
    FRAME_QUEUE.with(|queue| queue.borrow_mut().clear());
    FRAME_COUNT.with(|count| count.set(0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn setup() {
        reset_scheduler();
    }

    #[test]
    fn test_jobs_run_in_order_on_tick() {
        setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            request_animation_frame(move || {
                log.borrow_mut().push(n);
                Ok(())
            });
        }

        assert!(log.borrow().is_empty());
        assert_eq!(tick().unwrap(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(pending_jobs(), 0);
    }

    #[test]
    fn test_jobs_queued_during_tick_wait() {
        setup();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        request_animation_frame(move || {
            request_animation_frame(move || {
                flag.set(true);
                Ok(())
            });
            Ok(())
        });

        tick().unwrap();
        assert!(!ran.get());
        assert_eq!(pending_jobs(), 1);
        tick().unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_failure_does_not_block_other_jobs() {
        setup();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        request_animation_frame(|| anyhow::bail!("first"));
        request_animation_frame(move || {
            flag.set(true);
            Ok(())
        });

        let err = tick().unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.frame, 1);
        assert!(ran.get());
        assert_eq!(pending_jobs(), 0);
    }

    #[test]
    fn test_run_until_idle() {
        setup();
        request_animation_frame(|| {
            request_animation_frame(|| Ok(()));
            Ok(())
        });
        assert_eq!(run_until_idle(10).unwrap(), 2);
        assert_eq!(frame_count(), 2);
    }
}

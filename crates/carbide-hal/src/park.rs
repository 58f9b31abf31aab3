//! One-shot wake tokens for blocked threads.
//!
//! A [`Parker`] stands in for the scheduler's deschedule/make-runnable
//! pair. Each blocking call creates a fresh parker, publishes it to
//! whatever queue the wakeup will come through, and then parks. The wake
//! token is sticky: an `unpark` that lands before the `park` is never
//! lost, and spurious wakeups from the host are absorbed by re-checking
//! the token.

use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

/// A single-use wake token bound to the thread that created it.
pub struct Parker {
    woken: AtomicBool,
    thread: Thread,
}

impl Parker {
    /// Create a parker for the calling thread.
    pub fn for_current() -> Parker {
        Parker {
            woken: AtomicBool::new(false),
            thread: thread::current(),
        }
    }

    /// Block the creating thread until [`unpark`] is or has been called.
    ///
    /// Must be invoked from the thread that created this parker.
    ///
    /// [`unpark`]: Parker::unpark
    pub fn park(&self) {
        while !self.woken.load(Ordering::Acquire) {
            trace!("parking {:?}", self.thread.name().unwrap_or("<unnamed>"));
            thread::park();
        }
    }

    /// Deliver the wake token and make the parked thread runnable.
    ///
    /// Idempotent; callable from any thread, including while the target
    /// has not parked yet.
    pub fn unpark(&self) {
        self.woken.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

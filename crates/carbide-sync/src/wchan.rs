//! Named sleep/wake queues.
//!
//! A [`WaitChannel`] is where a context goes when a spinlock-protected
//! condition says it cannot proceed. The interface is deliberately
//! narrow: [`sleep`] consumes the guard of the spinlock protecting the
//! condition, and the wake calls demand a reference to that guard. The
//! waiter is enqueued *before* the spinlock is released, so a waker that
//! takes the spinlock afterwards cannot miss it; that ordering is the
//! whole defense against lost wakeups.
//!
//! `sleep` returns with the spinlock **not** held. A woken context
//! re-acquires the spinlock itself and re-checks its condition; wakeup
//! only means "eligible to run again", never "the condition holds".
//!
//! [`sleep`]: WaitChannel::sleep

use crate::error::{try_name, CreateError};
use crate::spinlock::{SpinLock, SpinLockGuard};
use carbide_hal::{critical_depth, Parker};
use log::trace;
use std::collections::VecDeque;
use std::sync::Arc;

pub struct WaitChannel {
    name: String,
    // Queue storage is internal to the channel; its micro-lock is only
    // ever taken while the caller already holds the associated spinlock.
    waiters: SpinLock<VecDeque<Arc<Parker>>>,
}

impl WaitChannel {
    pub fn new(name: &str) -> Result<WaitChannel, CreateError> {
        Ok(WaitChannel {
            name: try_name(name)?,
            waiters: SpinLock::new(VecDeque::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue the calling context, release `guard`, and block.
    ///
    /// Enqueue happens while `guard`'s spinlock is still held; the
    /// release and the descheduling are then a single step as far as any
    /// waker is concerned, because wakers must themselves hold that
    /// spinlock. Blocking with any spinlock beyond the protecting one
    /// still held is fatal.
    pub fn sleep<T>(&self, guard: SpinLockGuard<'_, T>) {
        assert_eq!(
            critical_depth(),
            1,
            "wait channel '{}': sleeping with an extra spinlock held",
            self.name
        );
        let waiter = Arc::new(Parker::for_current());
        {
            let mut waiters = self.waiters.lock();
            waiters.push_back(Arc::clone(&waiter));
        }
        drop(guard);
        trace!("wait channel '{}': blocking", self.name);
        waiter.park();
    }

    /// Wake one waiter, if any. The associated spinlock must be held and
    /// remains held.
    pub fn wake_one<T>(&self, _held: &SpinLockGuard<'_, T>) {
        let waiter = self.waiters.lock().pop_front();
        if let Some(waiter) = waiter {
            trace!("wait channel '{}': waking one", self.name);
            waiter.unpark();
        }
    }

    /// Wake every current waiter. The associated spinlock must be held
    /// and remains held.
    pub fn wake_all<T>(&self, _held: &SpinLockGuard<'_, T>) {
        let woken: Vec<Arc<Parker>> = {
            let mut waiters = self.waiters.lock();
            waiters.drain(..).collect()
        };
        if !woken.is_empty() {
            trace!("wait channel '{}': waking {}", self.name, woken.len());
        }
        for waiter in woken {
            waiter.unpark();
        }
    }
}

impl Drop for WaitChannel {
    fn drop(&mut self) {
        let waiters = self.waiters.lock();
        assert!(
            waiters.is_empty(),
            "wait channel '{}': destroyed with waiters",
            self.name
        );
    }
}

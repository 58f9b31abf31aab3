//! Condition variables.
//!
//! A [`CondVar`] owns nothing but a name and a wait channel; all mutual
//! exclusion during the wait/signal protocol is borrowed from the
//! [`Lock`] supplied on each call. That is what closes the lost-wakeup
//! window: the waiter enqueues and gives up the lock under the lock's
//! own spinlock, and a signaler cannot finish `acquire`, much less reach
//! `signal`, until that spinlock is released, by which point the waiter
//! is already queued.
//!
//! A given condvar must always be paired with the same lock; using two
//! different locks is a caller contract violation this layer does not
//! detect.

use crate::error::{try_name, CreateError};
use crate::lock::Lock;
use crate::types::ExecContext;
use crate::wchan::WaitChannel;
use log::{debug, trace};

pub struct CondVar {
    name: String,
    wchan: WaitChannel,
}

impl CondVar {
    pub fn new(name: &str) -> Result<CondVar, CreateError> {
        let name = try_name(name)?;
        let wchan = WaitChannel::new(&name)?;
        debug!("condvar '{}': created", name);
        Ok(CondVar { wchan, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically release `lock` and block until signaled, then
    /// re-acquire `lock` before returning.
    ///
    /// The caller must hold `lock` (fatal otherwise) and holds it again
    /// on return, no matter how many other contexts ran in between.
    /// Callers re-check their predicate after waking; a signal means the
    /// condition *was* made true, not that it still is.
    pub fn wait(&self, ctx: &ExecContext, lock: &Lock) {
        assert!(
            !ctx.in_interrupt(),
            "condvar '{}': wait from interrupt context",
            self.name
        );
        assert!(
            lock.do_i_hold(ctx),
            "condvar '{}': wait without holding lock '{}'",
            self.name,
            lock.name()
        );

        trace!("condvar '{}': waiting on '{}'", self.name, lock.name());
        let held = lock.release_internal(ctx);
        self.wchan.sleep(held);
        lock.acquire(ctx);
    }

    /// Wake at most one context blocked on this condvar.
    ///
    /// The caller must hold `lock` and keeps holding it; the woken
    /// waiter contends for the lock only once the caller releases it.
    pub fn signal(&self, ctx: &ExecContext, lock: &Lock) {
        assert!(
            lock.do_i_hold(ctx),
            "condvar '{}': signal without holding lock '{}'",
            self.name,
            lock.name()
        );
        let held = lock.lock_internal();
        self.wchan.wake_one(&held);
    }

    /// Wake every context currently blocked on this condvar.
    ///
    /// The caller must hold `lock` and keeps holding it.
    pub fn broadcast(&self, ctx: &ExecContext, lock: &Lock) {
        assert!(
            lock.do_i_hold(ctx),
            "condvar '{}': broadcast without holding lock '{}'",
            self.name,
            lock.name()
        );
        let held = lock.lock_internal();
        self.wchan.wake_all(&held);
    }
}

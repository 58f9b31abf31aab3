//! Single-owner blocking lock with ownership tracking.

use crate::error::{try_name, CreateError};
use crate::lockgraph::LockGraph;
use crate::spinlock::{SpinLock, SpinLockGuard};
use crate::types::ExecContext;
use crate::wchan::WaitChannel;
use carbide_hal::raise_high;
use log::{debug, trace};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const UNHELD: u32 = 0;

/// Mutual exclusion with an explicit owner.
///
/// Unlike a spinlock, contenders sleep. Unlike a semaphore initialized
/// to one, the lock knows who holds it: release by anyone else is fatal,
/// re-acquisition by the owner is fatal, and a condition variable can
/// borrow the lock's spinlock to make its release-and-sleep step
/// indivisible.
pub struct Lock {
    name: String,
    // Owning context's handle, or UNHELD. Written only while `spin` is
    // held; `do_i_hold` reads it lock-free.
    owner: AtomicU32,
    spin: SpinLock<()>,
    wchan: WaitChannel,
    graph: Option<Arc<dyn LockGraph>>,
}

impl Lock {
    pub fn new(name: &str) -> Result<Lock, CreateError> {
        Self::build(name, None)
    }

    /// Create a lock that reports wait/acquire/release transitions to a
    /// deadlock-graph observer.
    pub fn with_graph(name: &str, graph: Arc<dyn LockGraph>) -> Result<Lock, CreateError> {
        Self::build(name, Some(graph))
    }

    fn build(name: &str, graph: Option<Arc<dyn LockGraph>>) -> Result<Lock, CreateError> {
        let name = try_name(name)?;
        let wchan = WaitChannel::new(&name)?;
        debug!("lock '{}': created", name);
        Ok(Lock {
            owner: AtomicU32::new(UNHELD),
            spin: SpinLock::new(()),
            wchan,
            graph,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until this context owns the lock.
    ///
    /// Fatal from interrupt context, and fatal if the caller already
    /// holds the lock; acquisition is not recursive.
    pub fn acquire(&self, ctx: &ExecContext) {
        assert!(
            !ctx.in_interrupt(),
            "lock '{}': acquire from interrupt context",
            self.name
        );
        assert!(
            !self.do_i_hold(ctx),
            "lock '{}': recursive acquire",
            self.name
        );

        let mut held = self.spin.lock();
        // Owner assignment must also be atomic against local interrupt
        // delivery, not just other processors.
        let ipl = raise_high();
        if let Some(graph) = &self.graph {
            graph.wait_edge(ctx.handle(), &self.name);
        }
        while self.owner.load(Ordering::Acquire) != UNHELD {
            trace!("lock '{}': contended, blocking", self.name);
            self.wchan.sleep(held);
            held = self.spin.lock();
        }
        self.owner.store(ctx.handle().val(), Ordering::Release);
        if let Some(graph) = &self.graph {
            graph.acquire_edge(ctx.handle(), &self.name);
        }
        drop(ipl);
        drop(held);
    }

    /// Give up the lock and wake one contender, if any.
    ///
    /// Fatal unless the caller is the current owner.
    pub fn release(&self, ctx: &ExecContext) {
        assert!(
            self.do_i_hold(ctx),
            "lock '{}': release by non-owner",
            self.name
        );
        drop(self.release_internal(ctx));
    }

    /// True iff the calling context owns this lock.
    ///
    /// Lock-free: the only context that can read "yes" is the owner
    /// itself, and the owner cannot race its own release.
    pub fn do_i_hold(&self, ctx: &ExecContext) -> bool {
        self.owner.load(Ordering::Acquire) == ctx.handle().val()
    }

    /// Clear ownership and wake one contender, keeping the lock's
    /// spinlock held. The condvar consumes the returned guard to enqueue
    /// its waiter before any other context can get through `acquire` or
    /// reach a signal; that hand-off is what makes release-and-sleep
    /// indivisible.
    pub(crate) fn release_internal(&self, ctx: &ExecContext) -> SpinLockGuard<'_, ()> {
        let held = self.spin.lock();
        let ipl = raise_high();
        self.owner.store(UNHELD, Ordering::Release);
        self.wchan.wake_one(&held);
        if let Some(graph) = &self.graph {
            graph.release_edge(ctx.handle(), &self.name);
        }
        drop(ipl);
        held
    }

    /// Take the lock's internal spinlock, for condvar wake paths.
    pub(crate) fn lock_internal(&self) -> SpinLockGuard<'_, ()> {
        self.spin.lock()
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        assert_eq!(
            self.owner.load(Ordering::Acquire),
            UNHELD,
            "lock '{}': destroyed while held",
            self.name
        );
    }
}

//! Counting semaphore.

use crate::error::{try_name, CreateError};
use crate::spinlock::SpinLock;
use crate::types::ExecContext;
use crate::wchan::WaitChannel;
use log::{debug, trace};

/// A non-negative permit counter with blocking decrement.
///
/// The count is only ever touched under the semaphore's spinlock, which
/// also covers the wait channel, so a `down` that decides to block and
/// an `up` that hands out a permit can never miss each other.
pub struct Semaphore {
    name: String,
    count: SpinLock<u32>,
    wchan: WaitChannel,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits.
    pub fn new(name: &str, initial: u32) -> Result<Semaphore, CreateError> {
        let name = try_name(name)?;
        let wchan = WaitChannel::new(&name)?;
        debug!("semaphore '{}': created with {} permits", name, initial);
        Ok(Semaphore {
            count: SpinLock::new(initial),
            wchan,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// P operation: take a permit, blocking while none are available.
    ///
    /// Fatal from interrupt context. There is no FIFO ordering across
    /// contenders: a context arriving fresh may take a permit ahead of
    /// one that has been blocked longer.
    pub fn down(&self, ctx: &ExecContext) {
        assert!(
            !ctx.in_interrupt(),
            "semaphore '{}': down from interrupt context",
            self.name
        );

        let mut count = self.count.lock();
        while *count == 0 {
            trace!("semaphore '{}': no permits, blocking", self.name);
            self.wchan.sleep(count);
            // Re-acquire and re-check; the permit may already be gone.
            count = self.count.lock();
        }
        *count -= 1;
    }

    /// V operation: return a permit and wake one waiter, if any.
    ///
    /// Never blocks; legal from interrupt context.
    pub fn up(&self) {
        let mut count = self.count.lock();
        *count += 1;
        assert!(*count > 0, "semaphore '{}': count overflow", self.name);
        self.wchan.wake_one(&count);
    }
}

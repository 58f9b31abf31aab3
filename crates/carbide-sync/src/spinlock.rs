//! Busy-wait mutual exclusion for short critical sections.
//!
//! Acquiring a [`SpinLock`] enters a HAL critical section, so preemption
//! and interrupt delivery stay disabled on this processor for as long as
//! the guard lives. Critical sections must therefore be short, bounded,
//! and must never reach a blocking call; the wait channel asserts the
//! latter at every sleep.

use carbide_hal::CriticalSection;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Spin until the lock is acquired.
    ///
    /// Preemption is re-enabled between failed attempts so a holder
    /// preempted on this processor can run and release.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        loop {
            let section = CriticalSection::enter();
            if !self.locked.swap(true, Ordering::Acquire) {
                return SpinLockGuard {
                    lock: self,
                    _section: section,
                };
            }
            drop(section);
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }
}

/// Holds the lock and the processor's critical section; both end when
/// the guard drops. Passing a guard (or a reference to one) into the
/// wait-channel interface is the proof that the protecting spinlock is
/// held.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
    _section: CriticalSection,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Release the lock first; the critical section field drops after.
        self.lock.locked.store(false, Ordering::Release);
    }
}

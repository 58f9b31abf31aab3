//! Per-processor interrupt and preemption state.
//!
//! A spinlock critical section runs with preemption and interrupt
//! delivery disabled on the owning processor; the owner-assignment window
//! inside a lock additionally raises the interrupt priority level. On the
//! host there is no interrupt controller to program, so both are modeled
//! as thread-local bookkeeping that the synchronization layer reads back
//! in its assertions: a depth counter for critical sections and a current
//! [`InterruptLevel`].
//!
//! The invariant the counter exists to police: the critical depth must be
//! zero at every point a thread blocks. A nonzero depth at a blocking
//! call means some spinlock would be held across the sleep.

use core::cell::Cell;
use core::marker::PhantomData;

/// Processor-local interrupt priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLevel {
    /// All interrupt classes may be delivered.
    Normal,
    /// Local interrupt delivery suppressed.
    High,
}

struct CpuState {
    critical_depth: Cell<u32>,
    level: Cell<InterruptLevel>,
}

thread_local! {
    static CPU: CpuState = CpuState {
        critical_depth: Cell::new(0),
        level: Cell::new(InterruptLevel::Normal),
    };
}

/// Number of live critical sections on the current thread.
pub fn critical_depth() -> u32 {
    CPU.with(|cpu| cpu.critical_depth.get())
}

/// Current interrupt priority level of this thread.
pub fn current_level() -> InterruptLevel {
    CPU.with(|cpu| cpu.level.get())
}

/// A preemption-disabled window on the current processor.
///
/// Entering increments the thread's critical depth; dropping the guard
/// decrements it. While any guard is live the thread must not block.
pub struct CriticalSection {
    // Tied to the thread whose counter it bumped.
    _not_send: PhantomData<*mut ()>,
}

impl CriticalSection {
    pub fn enter() -> Self {
        CPU.with(|cpu| cpu.critical_depth.set(cpu.critical_depth.get() + 1));
        CriticalSection {
            _not_send: PhantomData,
        }
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        CPU.with(|cpu| cpu.critical_depth.set(cpu.critical_depth.get() - 1));
    }
}

/// Raise the interrupt priority level to [`InterruptLevel::High`],
/// returning a guard that restores the previous level when dropped.
pub fn raise_high() -> IplGuard {
    CPU.with(|cpu| {
        let prev = cpu.level.get();
        cpu.level.set(InterruptLevel::High);
        IplGuard {
            prev,
            _not_send: PhantomData,
        }
    })
}

/// Restores the interrupt priority level recorded at [`raise_high`].
pub struct IplGuard {
    prev: InterruptLevel,
    _not_send: PhantomData<*mut ()>,
}

impl Drop for IplGuard {
    fn drop(&mut self) {
        CPU.with(|cpu| cpu.level.set(self.prev));
    }
}

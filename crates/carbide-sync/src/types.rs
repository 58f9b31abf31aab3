use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

/// Thread identifier
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ThreadHandle(NonZeroU32);

impl ThreadHandle {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn val(&self) -> u32 {
        self.0.get()
    }
}

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Identity of the execution context invoking a primitive.
///
/// The primitives never consult an ambient "current thread" global;
/// whoever calls a blocking or ownership-tracked operation passes its own
/// token. A kernel thread mints one token at entry and uses it for its
/// lifetime. Interrupt handlers use [`ExecContext::interrupt`], which the
/// blocking operations reject.
#[derive(Debug, Clone)]
pub struct ExecContext {
    handle: ThreadHandle,
    in_interrupt: bool,
}

impl ExecContext {
    /// Mint a fresh identity for a preemptible kernel thread.
    pub fn new() -> Self {
        let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        ExecContext {
            handle: ThreadHandle::new(id).expect("thread handle space exhausted"),
            in_interrupt: false,
        }
    }

    /// Mint an identity for interrupt-handler context. Blocking
    /// operations invoked with this token are fatal.
    pub fn interrupt() -> Self {
        let mut ctx = Self::new();
        ctx.in_interrupt = true;
        ctx
    }

    pub fn handle(&self) -> ThreadHandle {
        self.handle
    }

    pub fn in_interrupt(&self) -> bool {
        self.in_interrupt
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}

use crate::types::ThreadHandle;

/// Observer for lock state transitions, for deadlock diagnostics.
///
/// Attached per-lock via [`Lock::with_graph`]; a lock without an
/// observer skips the hook entirely. Implementations record wait-for and
/// holds edges for cycle analysis elsewhere. They are called inside the
/// lock's critical section, so they must be non-blocking and must not
/// touch any Carbide primitive. The hook is purely observational and
/// never changes acquire/release outcomes.
///
/// [`Lock::with_graph`]: crate::lock::Lock::with_graph
pub trait LockGraph: Send + Sync {
    /// `ctx` is about to wait for `lock`.
    fn wait_edge(&self, ctx: ThreadHandle, lock: &str);

    /// `ctx` now owns `lock`.
    fn acquire_edge(&self, ctx: ThreadHandle, lock: &str);

    /// `ctx` gave up `lock`.
    fn release_edge(&self, ctx: ThreadHandle, lock: &str);
}

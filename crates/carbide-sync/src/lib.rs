//! Sleep-based synchronization primitives for the Carbide teaching
//! kernel: a counting [`Semaphore`], an ownership-tracked [`Lock`], and
//! a [`CondVar`], built on a [`SpinLock`] and a [`WaitChannel`].
//!
//! Contract violations (blocking from interrupt context, releasing a
//! lock you don't own, destroying an object with waiters) are defects
//! and panic; the only recoverable failure is allocation during `new`.

pub mod condvar;
pub mod error;
pub mod lock;
pub mod lockgraph;
pub mod semaphore;
pub mod spinlock;
pub mod types;
pub mod wchan;

pub use condvar::CondVar;
pub use error::CreateError;
pub use lock::Lock;
pub use lockgraph::LockGraph;
pub use semaphore::Semaphore;
pub use spinlock::{SpinLock, SpinLockGuard};
pub use types::{ExecContext, ThreadHandle};
pub use wchan::WaitChannel;

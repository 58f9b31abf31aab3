//! Host-model platform layer for the Carbide teaching kernel.
//!
//! Real kernels get these capabilities from the hardware: masking
//! interrupts, disabling preemption, and descheduling a thread until
//! another CPU pokes it awake. Carbide runs hosted, so this crate models
//! the same capabilities on top of the host's threads: per-thread
//! interrupt state that upper layers can assert against, and a one-shot
//! wake token for blocking.
//!
//! Nothing above this crate may busy-wait on host facilities directly;
//! the synchronization layer consumes only the interfaces exported here.

pub mod intr;
pub mod park;

pub use intr::*;
pub use park::*;

use anyhow::{ensure, Result};
use carbide_sync::{CondVar, ExecContext, Lock, Semaphore};
use clap::{Parser, Subcommand};
use log::info;
use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Contend a one-permit semaphore and verify exclusive occupancy
    Semaphore {
        /// Number of contending threads
        #[arg(long, default_value_t = 4)]
        threads: usize,

        /// Down/up rounds per thread
        #[arg(long, default_value_t = 1000)]
        rounds: usize,
    },
    /// Producer/consumer ring coordinated by a lock and two condvars
    BoundedBuffer {
        #[arg(long, default_value_t = 2)]
        producers: usize,

        #[arg(long, default_value_t = 2)]
        consumers: usize,

        /// Total items to push through the ring
        #[arg(long, default_value_t = 10_000)]
        items: u64,

        /// Ring capacity
        #[arg(long, default_value_t = 8)]
        capacity: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Semaphore { threads, rounds } => run_semaphore(threads, rounds),
        Commands::BoundedBuffer {
            producers,
            consumers,
            items,
            capacity,
        } => run_bounded_buffer(producers, consumers, items, capacity),
    }
}

fn run_semaphore(threads: usize, rounds: usize) -> Result<()> {
    println!("Contending one permit across {threads} threads, {rounds} rounds each...");

    let sem = Arc::new(Semaphore::new("demo-slot", 1)?);
    let occupancy = Arc::new(AtomicU32::new(0));
    let violations = Arc::new(AtomicU32::new(0));

    let workers: Vec<_> = (0..threads)
        .map(|i| {
            let sem = Arc::clone(&sem);
            let occupancy = Arc::clone(&occupancy);
            let violations = Arc::clone(&violations);
            thread::spawn(move || {
                let ctx = ExecContext::new();
                for _ in 0..rounds {
                    sem.down(&ctx);
                    if occupancy.fetch_add(1, Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::yield_now();
                    occupancy.fetch_sub(1, Ordering::SeqCst);
                    sem.up();
                }
                info!("worker {i} finished");
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    ensure!(
        violations.load(Ordering::SeqCst) == 0,
        "exclusive slot was shared"
    );
    println!("OK: {} slot entries, zero occupancy violations.", threads * rounds);
    Ok(())
}

struct Ring {
    lock: Lock,
    not_full: CondVar,
    not_empty: CondVar,
    // Touched only while `lock` is held.
    slots: UnsafeCell<VecDeque<u64>>,
    capacity: usize,
    done: AtomicBool,
}

unsafe impl Sync for Ring {}

impl Ring {
    fn new(capacity: usize) -> Result<Ring> {
        Ok(Ring {
            lock: Lock::new("ring")?,
            not_full: CondVar::new("ring-not-full")?,
            not_empty: CondVar::new("ring-not-empty")?,
            slots: UnsafeCell::new(VecDeque::with_capacity(capacity)),
            capacity,
            done: AtomicBool::new(false),
        })
    }

    fn push(&self, item: u64) {
        unsafe { (*self.slots.get()).push_back(item) }
    }

    fn pop(&self) -> Option<u64> {
        unsafe { (*self.slots.get()).pop_front() }
    }

    fn is_full(&self) -> bool {
        (unsafe { (*self.slots.get()).len() }) >= self.capacity
    }
}

fn produce(ring: &Ring, ctx: &ExecContext, items: impl Iterator<Item = u64>) {
    for item in items {
        ring.lock.acquire(ctx);
        while ring.is_full() {
            ring.not_full.wait(ctx, &ring.lock);
        }
        ring.push(item);
        ring.not_empty.signal(ctx, &ring.lock);
        ring.lock.release(ctx);
    }
}

fn consume(ring: &Ring, ctx: &ExecContext) -> (u64, u64) {
    let (mut taken, mut sum) = (0u64, 0u64);
    loop {
        ring.lock.acquire(ctx);
        let item = loop {
            if let Some(item) = ring.pop() {
                break Some(item);
            }
            if ring.done.load(Ordering::SeqCst) {
                break None;
            }
            ring.not_empty.wait(ctx, &ring.lock);
        };
        match item {
            Some(item) => {
                ring.not_full.signal(ctx, &ring.lock);
                ring.lock.release(ctx);
                taken += 1;
                sum += item;
            }
            None => {
                ring.lock.release(ctx);
                return (taken, sum);
            }
        }
    }
}

fn run_bounded_buffer(producers: usize, consumers: usize, items: u64, capacity: usize) -> Result<()> {
    ensure!(producers > 0 && consumers > 0 && capacity > 0, "need at least one of each");
    println!(
        "Pushing {items} items through a {capacity}-slot ring ({producers} producers, {consumers} consumers)..."
    );

    let ring = Arc::new(Ring::new(capacity)?);

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let ring = Arc::clone(&ring);
            let range = (p as u64..items).step_by(producers);
            thread::spawn(move || {
                let ctx = ExecContext::new();
                produce(&ring, &ctx, range);
                info!("producer {p} finished");
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|c| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let ctx = ExecContext::new();
                let totals = consume(&ring, &ctx);
                info!("consumer {c} finished with {} items", totals.0);
                totals
            })
        })
        .collect();

    for handle in producer_handles {
        handle.join().expect("producer panicked");
    }

    // Producers are drained; tell consumers to stop once the ring empties.
    let ctx = ExecContext::new();
    ring.lock.acquire(&ctx);
    ring.done.store(true, Ordering::SeqCst);
    ring.not_empty.broadcast(&ctx, &ring.lock);
    ring.lock.release(&ctx);

    let (mut taken, mut sum) = (0u64, 0u64);
    for handle in consumer_handles {
        let (t, s) = handle.join().expect("consumer panicked");
        taken += t;
        sum += s;
    }

    ensure!(taken == items, "delivered {taken} of {items} items");
    let expected: u64 = items * items.saturating_sub(1) / 2;
    ensure!(sum == expected, "checksum mismatch: {sum} != {expected}");
    println!("OK: {taken} items delivered exactly once.");
    Ok(())
}

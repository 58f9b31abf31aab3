use carbide_sync::{CondVar, ExecContext, Lock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn signal_after_waiter_blocks_is_not_lost() {
    let lock = Arc::new(Lock::new("cv-lock").unwrap());
    let cv = Arc::new(CondVar::new("cv").unwrap());
    let ready = Arc::new(AtomicBool::new(false));

    let waiter = {
        let (lock, cv, ready) = (Arc::clone(&lock), Arc::clone(&cv), Arc::clone(&ready));
        thread::spawn(move || {
            let ctx = ExecContext::new();
            lock.acquire(&ctx);
            while !ready.load(Ordering::SeqCst) {
                cv.wait(&ctx, &lock);
            }
            // Postcondition of wait: we hold the lock again.
            assert!(lock.do_i_hold(&ctx));
            lock.release(&ctx);
        })
    };

    let ctx = ExecContext::new();
    // This acquire can only succeed before the waiter ever held the
    // lock, or after wait released it; either way the store to `ready`
    // is serialized against the waiter's predicate check.
    lock.acquire(&ctx);
    ready.store(true, Ordering::SeqCst);
    cv.signal(&ctx, &lock);
    lock.release(&ctx);

    waiter.join().unwrap();
}

#[test]
fn lock_is_released_while_waiting_and_reacquired_after() {
    let lock = Arc::new(Lock::new("wait-lock").unwrap());
    let cv = Arc::new(CondVar::new("wait-cv").unwrap());
    let waiting = Arc::new(AtomicBool::new(false));
    let resumed = Arc::new(AtomicBool::new(false));

    let waiter = {
        let (lock, cv) = (Arc::clone(&lock), Arc::clone(&cv));
        let (waiting, resumed) = (Arc::clone(&waiting), Arc::clone(&resumed));
        thread::spawn(move || {
            let ctx = ExecContext::new();
            lock.acquire(&ctx);
            waiting.store(true, Ordering::SeqCst);
            cv.wait(&ctx, &lock);
            assert!(lock.do_i_hold(&ctx));
            resumed.store(true, Ordering::SeqCst);
            lock.release(&ctx);
        })
    };

    while !waiting.load(Ordering::SeqCst) {
        thread::yield_now();
    }

    let ctx = ExecContext::new();
    // Succeeding here proves the blocked waiter no longer holds the lock.
    lock.acquire(&ctx);
    assert!(!resumed.load(Ordering::SeqCst));
    cv.signal(&ctx, &lock);
    lock.release(&ctx);

    waiter.join().unwrap();
    assert!(resumed.load(Ordering::SeqCst));
}

#[test]
fn broadcast_wakes_every_waiter() {
    const WAITERS: usize = 8;
    let lock = Arc::new(Lock::new("bcast-lock").unwrap());
    let cv = Arc::new(CondVar::new("bcast-cv").unwrap());
    let go = Arc::new(AtomicBool::new(false));
    let waiting = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..WAITERS)
        .map(|_| {
            let (lock, cv) = (Arc::clone(&lock), Arc::clone(&cv));
            let (go, waiting) = (Arc::clone(&go), Arc::clone(&waiting));
            thread::spawn(move || {
                let ctx = ExecContext::new();
                lock.acquire(&ctx);
                waiting.fetch_add(1, Ordering::SeqCst);
                while !go.load(Ordering::SeqCst) {
                    cv.wait(&ctx, &lock);
                }
                lock.release(&ctx);
            })
        })
        .collect();

    let ctx = ExecContext::new();
    loop {
        lock.acquire(&ctx);
        // Holding the lock with the count at WAITERS means every worker
        // has passed its increment and is enqueued on the condvar.
        if waiting.load(Ordering::SeqCst) == WAITERS {
            break;
        }
        lock.release(&ctx);
        thread::yield_now();
    }
    go.store(true, Ordering::SeqCst);
    cv.broadcast(&ctx, &lock);
    lock.release(&ctx);

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn signal_wakes_at_most_one() {
    const WAITERS: usize = 2;
    let lock = Arc::new(Lock::new("one-lock").unwrap());
    let cv = Arc::new(CondVar::new("one-cv").unwrap());
    let go = Arc::new(AtomicBool::new(false));
    let waiting = Arc::new(AtomicUsize::new(0));
    let woken = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..WAITERS)
        .map(|_| {
            let (lock, cv) = (Arc::clone(&lock), Arc::clone(&cv));
            let (go, waiting, woken) = (
                Arc::clone(&go),
                Arc::clone(&waiting),
                Arc::clone(&woken),
            );
            thread::spawn(move || {
                let ctx = ExecContext::new();
                lock.acquire(&ctx);
                waiting.fetch_add(1, Ordering::SeqCst);
                // One wait is one wakeup: there are no spurious returns,
                // so counting returns counts delivered signals.
                cv.wait(&ctx, &lock);
                woken.fetch_add(1, Ordering::SeqCst);
                while !go.load(Ordering::SeqCst) {
                    cv.wait(&ctx, &lock);
                }
                lock.release(&ctx);
            })
        })
        .collect();

    let ctx = ExecContext::new();
    loop {
        lock.acquire(&ctx);
        if waiting.load(Ordering::SeqCst) == WAITERS {
            break;
        }
        lock.release(&ctx);
        thread::yield_now();
    }
    cv.signal(&ctx, &lock);
    lock.release(&ctx);

    while woken.load(Ordering::SeqCst) == 0 {
        thread::yield_now();
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(woken.load(Ordering::SeqCst), 1, "single signal woke more than one waiter");

    let cleanup = ExecContext::new();
    lock.acquire(&cleanup);
    go.store(true, Ordering::SeqCst);
    cv.broadcast(&cleanup, &lock);
    lock.release(&cleanup);
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
#[should_panic(expected = "wait from interrupt context")]
fn wait_from_interrupt_context_is_fatal() {
    let lock = Lock::new("isr-lock").unwrap();
    let cv = CondVar::new("isr-cv").unwrap();
    cv.wait(&ExecContext::interrupt(), &lock);
}

#[test]
#[should_panic(expected = "wait without holding lock")]
fn wait_without_lock_is_fatal() {
    let lock = Lock::new("unheld-lock").unwrap();
    let cv = CondVar::new("unheld-cv").unwrap();
    cv.wait(&ExecContext::new(), &lock);
}

#[test]
#[should_panic(expected = "signal without holding lock")]
fn signal_without_lock_is_fatal() {
    let lock = Lock::new("sig-lock").unwrap();
    let cv = CondVar::new("sig-cv").unwrap();
    cv.signal(&ExecContext::new(), &lock);
}

//! End-to-end scenario and property tests for `AltChunkedMaster`, run
//! against real OS threads (as opposed to the unit tests in
//! `src/runtime/*.rs`, which mostly drive a single container or a
//! `FlatThreadPool::scoped` single-threaded harness).

use std::collections::HashSet;
use std::sync::{Arc, Once};
use std::thread;

use amorphous::{AltChunkedMaster, AltChunkedQueue, AltChunkedStack, Fifo, FlatThreadPool, Lifo};
use proptest::prelude::*;

type Fwl = AltChunkedMaster<u32, 8, Fifo, AltChunkedQueue>;
type Lwl = AltChunkedMaster<u32, 8, Lifo, AltChunkedStack>;

static TRACING_INIT: Once = Once::new();

/// Routes this crate's `tracing` events (steals, overflows, allocator
/// pressure) to the test harness's captured output, the same way a worker
/// would wire them into its own subscriber in production. `RUST_LOG`
/// controls verbosity; nothing is emitted by default beyond what `tracing`'s
/// own filtering already suppresses.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

#[test]
fn single_thread_fifo_yields_push_order() {
    init_tracing();
    let pool = FlatThreadPool::new(vec![0]);
    let wl: Fwl = AltChunkedMaster::new(1);
    pool.scoped(0, || {
        for v in 1..=20 {
            wl.push(&*pool, v).unwrap();
        }
        let out: Vec<_> = std::iter::from_fn(|| wl.pop(&*pool)).collect();
        assert_eq!(out, (1..=20).collect::<Vec<_>>());
    });
}

#[test]
fn single_thread_lifo_yields_reverse_push_order() {
    init_tracing();
    let pool = FlatThreadPool::new(vec![0]);
    let wl: Lwl = AltChunkedMaster::new(1);
    pool.scoped(0, || {
        for v in 1..=20 {
            wl.push(&*pool, v).unwrap();
        }
        let out: Vec<_> = std::iter::from_fn(|| wl.pop(&*pool)).collect();
        assert_eq!(out, (1..=20).rev().collect::<Vec<_>>());
    });
}

#[test]
fn fifo_steal_half_scenario_covers_every_value_exactly_once() {
    init_tracing();
    let pool = FlatThreadPool::new(vec![0, 0]);
    let wl: Arc<Fwl> = Arc::new(AltChunkedMaster::new(2));

    pool.scoped(0, || {
        for v in 1..=200 {
            wl.push(&*pool, v).unwrap();
        }
    });

    let pool1 = Arc::clone(&pool);
    let wl1 = Arc::clone(&wl);
    let drainer = thread::spawn(move || {
        let mut out = Vec::new();
        pool1.scoped(1, || {
            while let Some(v) = wl1.pop(&*pool1) {
                out.push(v);
            }
        });
        out
    });

    let mut collected = drainer.join().unwrap();
    pool.scoped(0, || {
        while let Some(v) = wl.pop(&*pool) {
            collected.push(v);
        }
    });

    collected.sort_unstable();
    assert_eq!(collected, (1..=200).collect::<Vec<_>>());
}

#[test]
fn cross_package_scenario_consumes_every_task_exactly_once() {
    // Four threads, two packages of two. Thread 0 seeds 4000 tasks; every
    // other thread must only ever see each task once, even once stealing
    // crosses package boundaries.
    init_tracing();
    let pool = FlatThreadPool::new(vec![0, 0, 1, 1]);
    let wl: Arc<Fwl> = Arc::new(AltChunkedMaster::new(4));

    pool.scoped(0, || {
        for v in 0..4000 {
            wl.push(&*pool, v).unwrap();
        }
    });

    let mut handles = Vec::new();
    for tid in 0..4 {
        let pool = Arc::clone(&pool);
        let wl = Arc::clone(&wl);
        handles.push(thread::spawn(move || {
            let mut out = Vec::new();
            pool.scoped(tid, || {
                while let Some(v) = wl.pop(&*pool) {
                    out.push(v);
                }
            });
            out
        }));
    }

    let mut all = Vec::new();
    for h in handles {
        all.extend(h.join().unwrap());
    }

    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len(), "every task must be popped exactly once");
    assert_eq!(unique.len(), 4000);
}

#[test]
fn empty_worklist_quiesces_without_panicking() {
    init_tracing();
    let pool = FlatThreadPool::new(vec![0, 0]);
    let wl: Fwl = AltChunkedMaster::new(2);
    pool.scoped(0, || {
        for _ in 0..5 {
            assert_eq!(wl.pop(&*pool), None);
        }
    });
    pool.scoped(1, || {
        for _ in 0..5 {
            assert_eq!(wl.pop(&*pool), None);
        }
    });
}

#[test]
fn steal_from_an_empty_peer_is_a_no_op() {
    init_tracing();
    let pool = FlatThreadPool::new(vec![0, 0]);
    let wl: Fwl = AltChunkedMaster::new(2);
    pool.scoped(0, || {
        wl.push(&*pool, 42).unwrap();
    });
    pool.scoped(1, || {
        assert_eq!(wl.pop(&*pool), Some(42));
        assert_eq!(wl.pop(&*pool), None);
    });
}

proptest! {
    /// Conservation + no-duplication: whatever is pushed across several
    /// single-thread interleavings of push/pop comes back out as exactly
    /// that multiset, in some order, and nothing is ever popped twice.
    #[test]
    fn conservation_and_no_duplication(ops in prop::collection::vec(any::<bool>(), 0..500)) {
        init_tracing();
        let pool = FlatThreadPool::new(vec![0]);
        let wl: Fwl = AltChunkedMaster::new(1);
        let mut pushed = Vec::new();
        let mut popped = Vec::new();
        let mut next_value = 0u32;

        pool.scoped(0, || {
            for push in ops {
                if push {
                    wl.push(&*pool, next_value).unwrap();
                    pushed.push(next_value);
                    next_value += 1;
                } else if let Some(v) = wl.pop(&*pool) {
                    popped.push(v);
                }
            }
            while let Some(v) = wl.pop(&*pool) {
                popped.push(v);
            }
        });

        let mut pushed_sorted = pushed.clone();
        let mut popped_sorted = popped.clone();
        pushed_sorted.sort_unstable();
        popped_sorted.sort_unstable();
        prop_assert_eq!(pushed_sorted, popped_sorted);
    }

    /// FIFO locality with a single producer/consumer thread and no steals
    /// yields pop order equal to push order.
    #[test]
    fn fifo_single_thread_preserves_order(values in prop::collection::vec(any::<u32>(), 0..300)) {
        init_tracing();
        let pool = FlatThreadPool::new(vec![0]);
        let wl: Fwl = AltChunkedMaster::new(1);
        let out = pool.scoped(0, || {
            for &v in &values {
                wl.push(&*pool, v).unwrap();
            }
            std::iter::from_fn(|| wl.pop(&*pool)).collect::<Vec<_>>()
        });
        prop_assert_eq!(out, values);
    }

    /// LIFO locality with a single producer/consumer thread and no steals
    /// yields pop order equal to the reverse of push order.
    #[test]
    fn lifo_single_thread_reverses_order(values in prop::collection::vec(any::<u32>(), 0..300)) {
        init_tracing();
        let pool = FlatThreadPool::new(vec![0]);
        let wl: Lwl = AltChunkedMaster::new(1);
        let out = pool.scoped(0, || {
            for &v in &values {
                wl.push(&*pool, v).unwrap();
            }
            std::iter::from_fn(|| wl.pop(&*pool)).collect::<Vec<_>>()
        });
        let expected: Vec<_> = values.into_iter().rev().collect();
        prop_assert_eq!(out, expected);
    }
}

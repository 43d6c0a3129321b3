//! Concurrency Tests
//!
//! Writers on several threads against one item. Mutual exclusion comes
//! from the lock aspect; every stored write still triggers exactly once.

use crate::common::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;
const WRITES_PER_THREAD: usize = 200;

fn locked_factory(gauge: Arc<OverlapGauge>, audit: Arc<AuditAspect>) -> impl AspectFactory {
    factory_fn(move |_: &ItemDescriptor| {
        AspectChain::new()
            .with(LockAspect::new(Duration::from_secs(10)))
            .with_shared(gauge.clone())
            .with_shared(audit.clone())
    })
}

#[test]
fn lock_aspect_serializes_writers() {
    let (mut store, domain) = recorded_store();
    let gauge = Arc::new(OverlapGauge::default());
    let audit = Arc::new(AuditAspect::new());
    let factory = locked_factory(gauge.clone(), audit.clone());
    let key = store.create_with::<Counter, _>(&factory, "shared", 0i64).unwrap();
    let item = store.item(key).unwrap();

    thread::scope(|s| {
        for t in 0..THREADS {
            s.spawn(move || {
                for i in 0..WRITES_PER_THREAD {
                    item.write(Counter((t * WRITES_PER_THREAD + i) as i64));
                }
            });
        }
    });

    let expected = (THREADS * WRITES_PER_THREAD + 1) as u64;
    assert_eq!(gauge.max_inside(), 1);
    assert_eq!(item.write_count(), expected);
    assert_eq!(audit.stats().writes, expected);
    assert_eq!(domain.count_for(item.source()), expected as usize);

    let mut sequences = domain.sequences_for(item.source());
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=expected).collect::<Vec<_>>());
}

#[test]
fn readers_and_writers_share_an_item() {
    let (mut store, _domain) = recorded_store_with(AspectConfig {
        lock_timeout_ms: 10_000,
        ..AspectConfig::default()
    });
    let key = store.create::<Counter, _>("mixed", 1i64).unwrap();
    let item = store.item(key).unwrap();

    thread::scope(|s| {
        s.spawn(move || {
            for v in 0..500 {
                item.write(Counter(v * 2 + 1));
            }
        });
        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..500 {
                    // Every value ever stored is odd.
                    let value = item.read().unwrap();
                    assert_eq!(value.0 % 2, 1);
                }
            });
        }
    });

    assert_eq!(item.read().unwrap(), Counter(999));
}

#[test]
fn unlocked_items_admit_parallel_access() {
    let (mut store, _domain) = recorded_store_with(AspectConfig::none());
    let key = store.create::<u64, _>("free", 0u64).unwrap();
    let item = store.item(key).unwrap();

    thread::scope(|s| {
        for t in 0..THREADS as u64 {
            s.spawn(move || {
                for i in 0..WRITES_PER_THREAD as u64 {
                    item.write(t * 1_000 + i);
                    let _ = item.read().unwrap();
                }
            });
        }
    });

    // No lost trigger accounting even without serialization.
    assert_eq!(
        item.write_count(),
        (THREADS * WRITES_PER_THREAD + 1) as u64
    );
}

#[test]
fn read_queued_behind_write_observes_it() {
    let (mut store, _domain) = recorded_store();
    let marker = Arc::new(ReadMarker::default());
    let gate = Arc::new(WriteGate::default());
    let factory = {
        let (marker, gate) = (marker.clone(), gate.clone());
        factory_fn(move |_: &ItemDescriptor| {
            AspectChain::new()
                .with_shared(marker.clone())
                .with(LockAspect::new(Duration::from_secs(10)))
                .with_shared(gate.clone())
        })
    };
    let key = store.create_with::<Counter, _>(&factory, "queued", 1i64).unwrap();
    let item = store.item(key).unwrap();

    let seen = thread::scope(|s| {
        gate.arm();
        let writer = s.spawn(move || item.write(Counter(2)));
        gate.wait_entered();

        // The write holds the item lock; this read queues behind it.
        let reader = s.spawn(move || item.read().unwrap());
        marker.wait_for(1);
        gate.open();

        writer.join().unwrap();
        reader.join().unwrap()
    });
    assert_eq!(seen, Counter(2));
}

#[test]
fn read_lock_timeout_is_corrupt() {
    let (mut store, _domain) = recorded_store();
    let audit = Arc::new(AuditAspect::new());
    let gate = Arc::new(WriteGate::default());
    let factory = {
        let (audit, gate) = (audit.clone(), gate.clone());
        factory_fn(move |_: &ItemDescriptor| {
            AspectChain::new()
                .with_shared(audit.clone())
                .with(LockAspect::new(Duration::from_millis(20)))
                .with_shared(gate.clone())
        })
    };
    let key = store.create_with::<Counter, _>(&factory, "held", 1i64).unwrap();
    let item = store.item(key).unwrap();

    thread::scope(|s| {
        gate.arm();
        let writer = s.spawn(move || item.write(Counter(3)));
        gate.wait_entered();

        let mut out = Counter(-1);
        let err = item.read_into(&mut out).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("lock"));
        assert_eq!(out, Counter(-1));

        gate.open();
        writer.join().unwrap();
    });

    assert_eq!(item.read().unwrap(), Counter(3));
    let stats = audit.stats();
    assert_eq!(stats.refused_reads, 1);
    assert_eq!(stats.writes, 2);
}

//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

pub use dmodel::testing::RecordingDomain;
pub use dmodel::{
    factory_fn, Access, Affinity, Aspect, AspectChain, AspectConfig, AspectFactory, AuditAspect,
    CooperativeDomain, DataItem, DataStore, Error, ItemDescriptor, ItemKey, ItemState,
    LockAspect, NoAspects, StoreConfig, TriggerSource, ValidationAspect,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness, once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Value types
// ============================================================================

/// Counter value used by the model scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter(pub i64);

impl From<i64> for Counter {
    fn from(v: i64) -> Self {
        Counter(v)
    }
}

/// Value that holds a clone of a shared token, so tests can see when every
/// copy of it has been released.
#[derive(Debug, Clone)]
pub struct Tracked(pub Arc<()>);

impl From<Arc<()>> for Tracked {
    fn from(token: Arc<()>) -> Self {
        Tracked(token)
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Store bound to a fresh recording domain
pub fn recorded_store() -> (DataStore, Arc<RecordingDomain>) {
    recorded_store_with(AspectConfig::default())
}

/// Store bound to a fresh recording domain with the given default aspects
pub fn recorded_store_with(aspects: AspectConfig) -> (DataStore, Arc<RecordingDomain>) {
    init_tracing();
    let domain = Arc::new(RecordingDomain::new("recording"));
    let store = DataStore::builder()
        .name("test-store")
        .aspects(aspects)
        .affinity(Affinity::new(domain.clone()))
        .build()
        .unwrap();
    (store, domain)
}

/// Triggers recorded for one item
pub fn triggers_for<T: dmodel::ItemValue>(
    store: &DataStore,
    domain: &RecordingDomain,
    key: ItemKey<T>,
) -> usize {
    domain.count_for(store.item(key).unwrap().source())
}

// ============================================================================
// Aspects
// ============================================================================

/// Refuses every read
pub struct RefuseReads;

impl Aspect for RefuseReads {
    fn name(&self) -> &str {
        "refuse-reads"
    }

    fn before_read(&self, _access: &Access<'_>) -> bool {
        false
    }
}

/// Default protections followed by a veto on even counters
pub fn veto_even_factory() -> impl AspectFactory {
    factory_fn(|_: &ItemDescriptor| {
        AspectChain::new()
            .with(AuditAspect::new())
            .with(LockAspect::new(AspectConfig::default().lock_timeout()))
            .with(ValidationAspect::new("veto-even", |c: &Counter| c.0 % 2 != 0))
    })
}

/// Records the largest number of accesses it ever saw in flight at once
#[derive(Default)]
pub struct OverlapGauge {
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

impl OverlapGauge {
    pub fn max_inside(&self) -> usize {
        self.max_inside.load(Ordering::SeqCst)
    }

    fn enter(&self) -> bool {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
        true
    }

    fn leave(&self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Aspect for OverlapGauge {
    fn name(&self) -> &str {
        "overlap-gauge"
    }

    fn before_write(&self, _access: &Access<'_>) -> bool {
        self.enter()
    }

    fn after_write(&self, _permitted: bool, _access: &Access<'_>) {
        self.leave();
    }

    fn before_read(&self, _access: &Access<'_>) -> bool {
        self.enter()
    }

    fn after_read(&self, _permitted: bool, _access: &Access<'_>) {
        self.leave();
    }
}

/// Parks the next write inside its pre-hook until [`WriteGate::open`]
#[derive(Default)]
pub struct WriteGate {
    armed: AtomicBool,
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Default)]
struct GateState {
    entered: bool,
    opened: bool,
}

impl WriteGate {
    /// Catch the next write
    pub fn arm(&self) {
        *self.state.lock() = GateState::default();
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Block until the caught write is parked in the gate
    pub fn wait_entered(&self) {
        let mut state = self.state.lock();
        while !state.entered {
            self.changed.wait(&mut state);
        }
    }

    /// Let the caught write through
    pub fn open(&self) {
        self.state.lock().opened = true;
        self.changed.notify_all();
    }
}

impl Aspect for WriteGate {
    fn name(&self) -> &str {
        "write-gate"
    }

    fn before_write(&self, _access: &Access<'_>) -> bool {
        if self.armed.swap(false, Ordering::SeqCst) {
            let mut state = self.state.lock();
            state.entered = true;
            self.changed.notify_all();
            while !state.opened {
                self.changed.wait(&mut state);
            }
        }
        true
    }
}

/// Counts read attempts that reached it
#[derive(Default)]
pub struct ReadMarker {
    reads: AtomicUsize,
}

impl ReadMarker {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Spin until at least `n` reads have reached the marker
    pub fn wait_for(&self, n: usize) {
        while self.reads() < n {
            std::thread::yield_now();
        }
    }
}

impl Aspect for ReadMarker {
    fn name(&self) -> &str {
        "read-marker"
    }

    fn before_read(&self, _access: &Access<'_>) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        true
    }
}

//! Deterministic cooperative scheduling domain.
//!
//! [`CooperativeDomain`] queues trigger events and delivers them only when
//! its owner calls [`CooperativeDomain::run_pending`], on the caller's
//! thread. One run:
//!
//! 1. Takes every event queued so far.
//! 2. Calls `on_trigger` on each live subscriber of each event's source, in
//!    queue order.
//! 3. Calls `on_execute_if_triggered` once per distinct subscriber that
//!    received at least one event, in first-triggered order.
//!
//! Events raised while a run executes (for example, model logic writing a
//! data item) stay queued for the next run, so dependent logic never
//! re-enters itself.

use crate::affinity::SchedulingDomain;
use crate::trigger::{TriggerEvent, TriggerSource, Triggerable};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Outcome of one [`CooperativeDomain::run_pending`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Events taken from the queue
    pub events: usize,
    /// `on_trigger` deliveries
    pub notified: usize,
    /// `on_execute_if_triggered` calls
    pub executed: usize,
}

/// Domain metrics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    /// Events waiting for the next run
    pub queue_depth: usize,
    /// Events accepted since creation
    pub triggers_received: u64,
    /// Completed runs
    pub runs: u64,
    /// Total `on_execute_if_triggered` calls
    pub executions: u64,
}

/// A single-context scheduling domain driven by explicit runs
pub struct CooperativeDomain {
    name: String,
    queue: Mutex<VecDeque<TriggerEvent>>,
    subscribers: Mutex<FxHashMap<TriggerSource, Vec<Weak<dyn Triggerable>>>>,
    triggers_received: AtomicU64,
    runs: AtomicU64,
    executions: AtomicU64,
}

impl CooperativeDomain {
    /// Create an empty domain
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(VecDeque::new()),
            subscribers: Mutex::new(FxHashMap::default()),
            triggers_received: AtomicU64::new(0),
            runs: AtomicU64::new(0),
            executions: AtomicU64::new(0),
        }
    }

    /// Create an empty domain behind an `Arc`, ready for [`crate::Affinity::new`]
    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Number of live subscribers for `source`
    pub fn subscriber_count(&self, source: TriggerSource) -> usize {
        self.subscribers
            .lock()
            .get(&source)
            .map(|deps| deps.iter().filter(|d| d.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Deliver everything queued so far
    pub fn run_pending(&self) -> RunStats {
        let events: Vec<TriggerEvent> = self.queue.lock().drain(..).collect();
        let mut stats = RunStats {
            events: events.len(),
            ..RunStats::default()
        };
        if events.is_empty() {
            return stats;
        }

        let mut triggered: Vec<Arc<dyn Triggerable>> = Vec::new();
        for event in &events {
            // Never call out while holding the table lock: dependents may subscribe.
            let dependents = self.live_subscribers(event.source);
            for dependent in dependents {
                dependent.on_trigger(event);
                stats.notified += 1;
                let seen = triggered
                    .iter()
                    .any(|t| Arc::as_ptr(t) as *const () == Arc::as_ptr(&dependent) as *const ());
                if !seen {
                    triggered.push(dependent);
                }
            }
        }

        for dependent in &triggered {
            dependent.on_execute_if_triggered();
        }
        stats.executed = triggered.len();

        self.runs.fetch_add(1, Ordering::Relaxed);
        self.executions
            .fetch_add(stats.executed as u64, Ordering::Relaxed);
        debug!(
            domain = %self.name,
            events = stats.events,
            notified = stats.notified,
            executed = stats.executed,
            "Cooperative run complete"
        );
        stats
    }

    /// Return a snapshot of domain metrics.
    pub fn stats(&self) -> DomainStats {
        DomainStats {
            queue_depth: self.pending(),
            triggers_received: self.triggers_received.load(Ordering::Relaxed),
            runs: self.runs.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
        }
    }

    fn live_subscribers(&self, source: TriggerSource) -> Vec<Arc<dyn Triggerable>> {
        let mut table = self.subscribers.lock();
        let Some(deps) = table.get_mut(&source) else {
            return Vec::new();
        };
        deps.retain(|d| d.strong_count() > 0);
        deps.iter().filter_map(Weak::upgrade).collect()
    }
}

impl SchedulingDomain for CooperativeDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self, event: TriggerEvent) {
        trace!(domain = %self.name, source = %event.source, sequence = event.sequence, "Trigger queued");
        self.queue.lock().push_back(event);
        self.triggers_received.fetch_add(1, Ordering::Relaxed);
    }

    fn subscribe(&self, source: TriggerSource, dependent: Weak<dyn Triggerable>) {
        self.subscribers
            .lock()
            .entry(source)
            .or_default()
            .push(dependent);
    }

    fn unsubscribe(&self, source: TriggerSource) {
        self.subscribers.lock().remove(&source);
    }
}

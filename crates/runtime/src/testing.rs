//! Testing utilities for trigger behaviour
//!
//! [`RecordingDomain`] is a scheduling domain that records every trigger
//! request synchronously and never runs anything, so tests can count
//! exactly how many triggers a sequence of operations issued.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dmodel_runtime::{Affinity, testing::RecordingDomain};
//!
//! let domain = Arc::new(RecordingDomain::new("test"));
//! let affinity = Affinity::new(domain.clone());
//! // ... create a store with `affinity`, write items ...
//! assert_eq!(domain.total(), 2);
//! ```

use crate::affinity::SchedulingDomain;
use crate::trigger::{TriggerEvent, TriggerSource, Triggerable};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Weak;

/// Scheduling domain that only records what it is asked to do
pub struct RecordingDomain {
    name: String,
    events: Mutex<Vec<TriggerEvent>>,
    subscriptions: Mutex<FxHashMap<TriggerSource, usize>>,
}

impl RecordingDomain {
    /// Create an empty recorder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(FxHashMap::default()),
        }
    }

    /// All recorded events in arrival order
    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().clone()
    }

    /// Total number of recorded events
    pub fn total(&self) -> usize {
        self.events.lock().len()
    }

    /// Number of events recorded for `source`
    pub fn count_for(&self, source: TriggerSource) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.source == source)
            .count()
    }

    /// Sequence numbers recorded for `source`, in arrival order
    pub fn sequences_for(&self, source: TriggerSource) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.sequence)
            .collect()
    }

    /// Number of subscriptions currently registered for `source`
    pub fn subscriber_count(&self, source: TriggerSource) -> usize {
        self.subscriptions.lock().get(&source).copied().unwrap_or(0)
    }

    /// Forget all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SchedulingDomain for RecordingDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self, event: TriggerEvent) {
        self.events.lock().push(event);
    }

    fn subscribe(&self, source: TriggerSource, _dependent: Weak<dyn Triggerable>) {
        *self.subscriptions.lock().entry(source).or_insert(0) += 1;
    }

    fn unsubscribe(&self, source: TriggerSource) {
        self.subscriptions.lock().remove(&source);
    }
}

//! Scheduling domains and thread affinity
//!
//! A [`SchedulingDomain`] is the cooperative execution context that runs
//! dependent logic. An [`Affinity`] is a cheap, clonable binding to one
//! domain (or to none). Data stores hand their affinity to every item they
//! create; items issue their trigger requests through it.
//!
//! The domain is always passed explicitly. There is no process-global
//! scheduler, so tests substitute a recording domain.

use crate::trigger::{TriggerEvent, TriggerSource, Triggerable};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// A cooperative execution context that runs triggered logic
///
/// Implementations must tolerate calls from any thread. Whether several
/// events are coalesced into one execution is the domain's decision.
pub trait SchedulingDomain: Send + Sync {
    /// Domain name, used in diagnostics
    fn name(&self) -> &str;

    /// Request that dependents of `event.source` run inside this domain
    fn trigger(&self, event: TriggerEvent);

    /// Register `dependent` to be woken when `source` fires
    ///
    /// The domain holds only a weak reference; a dependent that is dropped
    /// is silently skipped.
    fn subscribe(&self, source: TriggerSource, dependent: Weak<dyn Triggerable>);

    /// Remove every dependent registered for `source`
    fn unsubscribe(&self, source: TriggerSource);
}

/// Binding of an item or store to a scheduling domain
#[derive(Clone, Default)]
pub struct Affinity {
    domain: Option<Arc<dyn SchedulingDomain>>,
}

impl Affinity {
    /// Bind to `domain`
    pub fn new(domain: Arc<dyn SchedulingDomain>) -> Self {
        Self {
            domain: Some(domain),
        }
    }

    /// Not bound to any domain; triggers are dropped
    pub fn unbound() -> Self {
        Self { domain: None }
    }

    /// Whether a domain is attached
    pub fn is_bound(&self) -> bool {
        self.domain.is_some()
    }

    /// Name of the attached domain
    pub fn domain_name(&self) -> Option<&str> {
        self.domain.as_deref().map(|d| d.name())
    }

    /// Whether both affinities refer to the same domain instance
    ///
    /// Two unbound affinities compare equal.
    pub fn same_domain(&self, other: &Affinity) -> bool {
        match (&self.domain, &other.domain) {
            (Some(a), Some(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// Forward a trigger to the domain
    ///
    /// Returns `false` when unbound and the trigger was dropped.
    pub fn trigger(&self, event: TriggerEvent) -> bool {
        match &self.domain {
            Some(domain) => {
                domain.trigger(event);
                true
            }
            None => {
                debug!(source = %event.source, sequence = event.sequence, "Trigger dropped: no affinity");
                false
            }
        }
    }

    /// Subscribe `dependent` to `source` in the bound domain
    pub fn subscribe(&self, source: TriggerSource, dependent: Weak<dyn Triggerable>) {
        if let Some(domain) = &self.domain {
            domain.subscribe(source, dependent);
        }
    }

    /// Remove the subscriptions for `source` in the bound domain
    pub fn unsubscribe(&self, source: TriggerSource) {
        if let Some(domain) = &self.domain {
            domain.unsubscribe(source);
        }
    }
}

impl fmt::Debug for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain_name() {
            Some(name) => write!(f, "Affinity({})", name),
            None => write!(f, "Affinity(unbound)"),
        }
    }
}

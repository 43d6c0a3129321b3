//! Trigger sources, events and the `Triggerable` capability

use crate::affinity::Affinity;
use dmodel_core::{ItemId, StoreId};
use std::fmt;

/// Something that can fire a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// A data item, identified by its owning store and its id
    Item {
        /// Owning store
        store: StoreId,
        /// Item within the store
        item: ItemId,
    },
    /// A data store as a whole
    Store(StoreId),
}

impl TriggerSource {
    /// Source for an item of a store
    pub fn item(store: StoreId, item: ItemId) -> Self {
        TriggerSource::Item { store, item }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Item { store, item } => write!(f, "{}@{}", item, store),
            TriggerSource::Store(store) => write!(f, "store@{}", store),
        }
    }
}

/// One trigger request issued by a source
///
/// `sequence` is the source's count of successful writes at the moment it
/// fired, so a dependent can tell whether it observed every write or the
/// domain coalesced some of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Who fired
    pub source: TriggerSource,
    /// Source-local sequence number, starting at 1
    pub sequence: u64,
}

impl TriggerEvent {
    /// Create a new event
    pub fn new(source: TriggerSource, sequence: u64) -> Self {
        Self { source, sequence }
    }
}

/// Dependent logic that a scheduling domain can wake
///
/// A domain calls `on_trigger` for every event from a source the dependent
/// is subscribed to, and later calls `on_execute_if_triggered` from inside
/// the domain so the dependent runs its logic there.
pub trait Triggerable: Send + Sync {
    /// A subscribed source fired
    fn on_trigger(&self, event: &TriggerEvent);

    /// Run pending logic if any trigger arrived since the last execution
    fn on_execute_if_triggered(&self);

    /// The dependent was bound to a (possibly different) scheduling domain
    fn on_affinity(&self, _affinity: &Affinity) {}
}

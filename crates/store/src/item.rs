//! DataItem: a typed value cell behind an aspect chain
//!
//! ## Design Principles
//!
//! 1. **Guarded Access**: the value is reachable only through [`DataItem::write`]
//!    and [`DataItem::read`]; both run the item's aspect chain.
//! 2. **One Trigger Per Write**: a permitted write stores the candidate, then
//!    fires exactly one trigger, then runs the post-write hooks.
//! 3. **Silent Veto, Loud Corruption**: a refused write is a no-op; a refused
//!    read is a `Corrupt` fault, because a live item must always be readable.
//!
//! ## Write Sequence
//!
//! ```text
//! 1. before_write hooks over the candidate (short-circuit on veto)
//! 2. IF permitted: swap the candidate in, fire trigger(sequence)
//! 3. after_write hooks (always, reverse order)
//! ```
//!
//! ## Storage
//!
//! The cell holds an `Arc<T>`. Writers swap the `Arc` under a short write
//! lock; readers clone the `Arc` under a short read lock and run the hooks
//! over that snapshot, so the value handed out is exactly the value the
//! aspects approved. If a write lands while the read hooks run, the read
//! starts over on the new value, so a read queued behind a write sees that
//! write. The internal lock only keeps the swap memory-safe: no
//! cell lock is ever held while a hook runs, and serializing whole accesses
//! is left to a locking aspect.
//!
//! Items are constructed only by [`crate::DataStore`].

use dmodel_aspects::{Access, AspectChain, ItemDescriptor};
use dmodel_core::{ErrComponent, ItemId, Result, StoreId, SystemError};
use dmodel_runtime::{Affinity, TriggerEvent, TriggerSource};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Passes a read may make before settling on an approved snapshot
const MAX_READ_ATTEMPTS: u32 = 8;

/// Types a data item can hold
pub trait ItemValue: Any + Clone + Send + Sync {}

impl<T: Any + Clone + Send + Sync> ItemValue for T {}

/// Lifecycle state of a data item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemState {
    /// Constructed, initial write not yet performed
    Uninitialized = 0,
    /// Initial write performed; reads and writes are valid
    Live = 1,
    /// Removed from its store
    Destroyed = 2,
}

impl ItemState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ItemState::Uninitialized,
            1 => ItemState::Live,
            _ => ItemState::Destroyed,
        }
    }
}

/// A guarded, typed value cell owned by a [`crate::DataStore`]
///
/// `DataItem` is neither `Clone` nor constructible outside this crate:
/// dependents refer to the one instance its store owns.
pub struct DataItem<T> {
    descriptor: ItemDescriptor,
    value: RwLock<Arc<T>>,
    aspects: AspectChain,
    affinity: RwLock<Affinity>,
    writes: AtomicU64,
    state: AtomicU8,
}

impl<T: ItemValue> DataItem<T> {
    pub(crate) fn new(
        descriptor: ItemDescriptor,
        initial: T,
        aspects: AspectChain,
        affinity: Affinity,
    ) -> Self {
        Self {
            descriptor,
            value: RwLock::new(Arc::new(initial)),
            aspects,
            affinity: RwLock::new(affinity),
            writes: AtomicU64::new(0),
            state: AtomicU8::new(ItemState::Uninitialized as u8),
        }
    }

    /// Write a new value
    ///
    /// The value is stored only if every aspect permits it; in that case
    /// exactly one trigger is issued to the item's affinity. A vetoed write
    /// returns normally and leaves the stored value unchanged.
    pub fn write(&self, value: T) {
        let candidate = Arc::new(value);
        let passage = self
            .aspects
            .before_write(Access::new(&self.descriptor, &*candidate));

        if passage.permitted() {
            *self.value.write() = Arc::clone(&candidate);
            let sequence = self.writes.fetch_add(1, Ordering::AcqRel) + 1;
            trace!(item = %self.descriptor.id(), name = self.descriptor.name(), sequence, "Write stored");
            self.fire(sequence);
        } else {
            debug!(
                item = %self.descriptor.id(),
                name = self.descriptor.name(),
                vetoed_by = passage.vetoed_by().unwrap_or_default(),
                "Write vetoed"
            );
        }

        // Post-write hooks run here, after the trigger, on every path.
        drop(passage);
    }

    /// Read the current value
    ///
    /// # Errors
    ///
    /// Returns a `Framework/Runtime/Corrupt` system error if any aspect
    /// refuses the read.
    pub fn read(&self) -> Result<T> {
        self.guarded_read(T::clone)
    }

    /// Read the current value into `out`
    ///
    /// `out` is left untouched when the read is refused.
    ///
    /// # Errors
    ///
    /// Returns a `Framework/Runtime/Corrupt` system error if any aspect
    /// refuses the read.
    pub fn read_into(&self, out: &mut T) -> Result<()> {
        self.guarded_read(|current| out.clone_from(current))
    }

    fn guarded_read<R>(&self, copy_out: impl FnOnce(&T) -> R) -> Result<R> {
        let mut attempts = 1;
        loop {
            let current = Arc::clone(&*self.value.read());
            let passage = self
                .aspects
                .before_read(Access::new(&self.descriptor, &*current));

            if !passage.permitted() {
                let refused_by = passage.vetoed_by().unwrap_or_default().to_owned();
                drop(passage);
                error!(
                    item = %self.descriptor.id(),
                    name = self.descriptor.name(),
                    refused_by = %refused_by,
                    "Read refused on live item"
                );
                return Err(SystemError::corrupt(
                    ErrComponent::Runtime,
                    format!(
                        "DataItem<{}>::read of '{}' encountered invalid content and could not return valid data (refused by '{}')",
                        self.descriptor.type_name(),
                        self.descriptor.name(),
                        refused_by
                    ),
                )
                .into());
            }

            // A write that completed while the hooks ran (e.g. one the read
            // was queued behind) superseded the snapshot; read it afresh.
            if attempts < MAX_READ_ATTEMPTS && !Arc::ptr_eq(&current, &*self.value.read()) {
                trace!(
                    item = %self.descriptor.id(),
                    attempts,
                    "Read snapshot superseded, retrying"
                );
                drop(passage);
                attempts += 1;
                continue;
            }

            let out = copy_out(current.as_ref());
            drop(passage);
            return Ok(out);
        }
    }

    fn fire(&self, sequence: u64) {
        let affinity = self.affinity.read().clone();
        affinity.trigger(TriggerEvent::new(self.source(), sequence));
    }

    pub(crate) fn set_state(&self, state: ItemState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl<T> DataItem<T> {
    /// Item id within its store
    pub fn id(&self) -> ItemId {
        self.descriptor.id()
    }

    /// Owning store
    pub fn store_id(&self) -> StoreId {
        self.descriptor.store()
    }

    /// Item name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Name of the stored value type
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// Static description shared with the aspects
    pub fn descriptor(&self) -> &ItemDescriptor {
        &self.descriptor
    }

    /// Lifecycle state
    pub fn state(&self) -> ItemState {
        ItemState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Successful writes so far, including the initial write
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Names of the attached aspects, in chain order
    pub fn aspect_names(&self) -> Vec<&str> {
        self.aspects.names()
    }

    /// The scheduling domain binding this item triggers through
    pub fn affinity(&self) -> Affinity {
        self.affinity.read().clone()
    }

    /// Trigger source identifying this item
    pub fn source(&self) -> TriggerSource {
        TriggerSource::item(self.descriptor.store(), self.descriptor.id())
    }
}

impl<T> fmt::Debug for DataItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataItem")
            .field("id", &self.descriptor.id())
            .field("name", &self.descriptor.name())
            .field("type", &self.descriptor.type_name())
            .field("state", &self.state())
            .field("writes", &self.write_count())
            .field("aspects", &self.aspects)
            .finish()
    }
}

// ============================================================================
// Type-erased view used by the store
// ============================================================================

/// What the store needs from an item without knowing its value type
pub(crate) trait StoredItem: Send + Sync {
    fn descriptor(&self) -> &ItemDescriptor;
    fn bind_affinity(&self, affinity: &Affinity);
    fn mark_destroyed(&self);
    fn as_any(&self) -> &dyn Any;

    fn source(&self) -> TriggerSource {
        let descriptor = self.descriptor();
        TriggerSource::item(descriptor.store(), descriptor.id())
    }
}

impl<T: ItemValue> StoredItem for DataItem<T> {
    fn descriptor(&self) -> &ItemDescriptor {
        &self.descriptor
    }

    fn bind_affinity(&self, affinity: &Affinity) {
        *self.affinity.write() = affinity.clone();
    }

    fn mark_destroyed(&self) {
        self.set_state(ItemState::Destroyed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

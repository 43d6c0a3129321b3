//! DataStore: factory and sole owner of data items
//!
//! A store creates items, attaches their aspects, binds them to its
//! affinity and destroys them. Dependents hold [`ItemKey`]s and borrow the
//! items through the store, so an item can never outlive its owner.
//!
//! The store is itself triggerable. It subscribes to every item it owns;
//! when any of them is written, the store becomes triggered, and the next
//! `execute_if_triggered` runs the model hooks registered with
//! [`DataStore::on_execute`] once, however many writes happened in between.

use crate::arena::Arena;
use crate::builder::DataStoreBuilder;
use crate::item::{DataItem, ItemState, ItemValue, StoredItem};
use dmodel_aspects::{AspectFactory, DefaultAspectFactory, ItemDescriptor};
use dmodel_core::{Error, ItemId, Result, StoreConfig, StoreId};
use dmodel_runtime::{Affinity, TriggerEvent, TriggerSource, Triggerable};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

// ============================================================================
// ItemKey
// ============================================================================

/// Typed handle to an item owned by a [`DataStore`]
///
/// Keys are cheap to copy. Presenting a key to a store that did not issue
/// it, or after its item was destroyed, yields an error instead of an item.
pub struct ItemKey<T> {
    store: StoreId,
    id: ItemId,
    _type: PhantomData<fn() -> T>,
}

impl<T> ItemKey<T> {
    fn new(store: StoreId, id: ItemId) -> Self {
        Self {
            store,
            id,
            _type: PhantomData,
        }
    }

    /// Item id within the issuing store
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Store that issued this key
    pub fn store(&self) -> StoreId {
        self.store
    }
}

impl<T> Clone for ItemKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ItemKey<T> {}

impl<T> PartialEq for ItemKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store && self.id == other.id
    }
}

impl<T> Eq for ItemKey<T> {}

impl<T> Hash for ItemKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.hash(state);
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ItemKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey<{}>({})", std::any::type_name::<T>(), self.id)
    }
}

// ============================================================================
// Store signal
// ============================================================================

type ModelHook = Box<dyn FnMut(u64) + Send>;

/// The store's triggerable half, shared with its scheduling domain
struct StoreSignal {
    store: StoreId,
    triggered: AtomicBool,
    pending: AtomicU64,
    executions: AtomicU64,
    hooks: Mutex<Vec<ModelHook>>,
}

impl StoreSignal {
    fn new(store: StoreId) -> Self {
        Self {
            store,
            triggered: AtomicBool::new(false),
            pending: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            hooks: Mutex::new(Vec::new()),
        }
    }

    fn execute(&self) -> bool {
        if !self.triggered.swap(false, Ordering::AcqRel) {
            return false;
        }
        let triggers = self.pending.swap(0, Ordering::AcqRel);
        let mut hooks = self.hooks.lock();
        for hook in hooks.iter_mut() {
            hook(triggers);
        }
        self.executions.fetch_add(1, Ordering::Relaxed);
        debug!(store = %self.store, triggers, hooks = hooks.len(), "Store executed");
        true
    }
}

impl Triggerable for StoreSignal {
    fn on_trigger(&self, _event: &TriggerEvent) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.triggered.store(true, Ordering::Release);
    }

    fn on_execute_if_triggered(&self) {
        self.execute();
    }
}

// ============================================================================
// DataStore
// ============================================================================

/// Factory and owner of data items, bound to one scheduling domain
pub struct DataStore {
    id: StoreId,
    config: StoreConfig,
    default_factory: DefaultAspectFactory,
    items: Arena,
    names: FxHashMap<String, ItemId>,
    affinity: RwLock<Affinity>,
    signal: Arc<StoreSignal>,
    store_triggers: AtomicU64,
}

impl DataStore {
    /// Create an unbound store with the default configuration
    pub fn new() -> Self {
        Self::from_parts(StoreConfig::default(), Affinity::unbound())
    }

    /// Create an unbound store from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.aspects.validate()?;
        Ok(Self::from_parts(config, Affinity::unbound()))
    }

    /// Builder for a store with a name, configuration and affinity
    pub fn builder() -> DataStoreBuilder {
        DataStoreBuilder::new()
    }

    pub(crate) fn from_parts(config: StoreConfig, affinity: Affinity) -> Self {
        let id = StoreId::new();
        let store = Self {
            id,
            default_factory: DefaultAspectFactory::new(config.aspects.clone()),
            config,
            items: Arena::new(),
            names: FxHashMap::default(),
            affinity: RwLock::new(affinity),
            signal: Arc::new(StoreSignal::new(id)),
            store_triggers: AtomicU64::new(0),
        };
        store
            .affinity
            .read()
            .subscribe(TriggerSource::Store(id), store.signal_weak());
        info!(
            store = %id,
            name = %store.config.name,
            affinity = ?*store.affinity.read(),
            "Data store created"
        );
        store
    }

    // ========================================================================
    // Item lifecycle
    // ========================================================================

    /// Create an item with the store's default aspects
    ///
    /// The item starts out holding `T::from(args)` and then receives one
    /// guarded write of another `T::from(args)`, so a fresh item has
    /// already triggered once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the store already owns an item
    /// called `name`, and [`Error::StoreFull`] once the store's item id
    /// space is used up.
    pub fn create<T, A>(&mut self, name: impl Into<String>, args: A) -> Result<ItemKey<T>>
    where
        T: ItemValue + From<A>,
        A: Clone,
    {
        let factory = self.default_factory.clone();
        self.create_in(&factory, name.into(), args)
    }

    /// Create an item whose aspects come from `factory`
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the store already owns an item
    /// called `name`, and [`Error::StoreFull`] once the store's item id
    /// space is used up.
    pub fn create_with<T, A>(
        &mut self,
        factory: &dyn AspectFactory,
        name: impl Into<String>,
        args: A,
    ) -> Result<ItemKey<T>>
    where
        T: ItemValue + From<A>,
        A: Clone,
    {
        self.create_in(factory, name.into(), args)
    }

    fn create_in<T, A>(
        &mut self,
        factory: &dyn AspectFactory,
        name: String,
        args: A,
    ) -> Result<ItemKey<T>>
    where
        T: ItemValue + From<A>,
        A: Clone,
    {
        if self.names.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }

        let store_id = self.id;
        let affinity = self.affinity.read().clone();
        let signal = self.signal_weak();
        let item_name = name.clone();
        let id = self.items.insert_with(|id| {
            let descriptor = ItemDescriptor::new::<T>(store_id, id, item_name);
            let aspects = factory.create_aspects(&descriptor);
            let item = DataItem::new(descriptor, T::from(args.clone()), aspects, affinity.clone());
            affinity.subscribe(item.source(), signal);
            item.write(T::from(args));
            item.set_state(ItemState::Live);
            Box::new(item) as Box<dyn StoredItem>
        });
        let Some(id) = id else {
            warn!(store = %self.id, name = %name, "Item id space exhausted");
            return Err(Error::StoreFull(self.id));
        };

        debug!(
            store = %self.id,
            item = %id,
            name = %name,
            value_type = std::any::type_name::<T>(),
            "Item created"
        );
        self.names.insert(name, id);
        Ok(ItemKey::new(self.id, id))
    }

    /// Destroy an item and release its value
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignItem`] for a key issued by another store and
    /// [`Error::StaleItem`] if the item was already destroyed.
    pub fn destroy<T>(&mut self, key: ItemKey<T>) -> Result<()> {
        self.check_owner(key.store, key.id)?;
        let item = self.items.remove(key.id).ok_or(Error::StaleItem(key.id))?;
        self.release(item);
        Ok(())
    }

    fn release(&mut self, item: Box<dyn StoredItem>) {
        self.affinity.read().unsubscribe(item.source());
        let descriptor = item.descriptor();
        if self.names.get(descriptor.name()) == Some(&descriptor.id()) {
            self.names.remove(descriptor.name());
        }
        item.mark_destroyed();
        debug!(
            store = %self.id,
            item = %descriptor.id(),
            name = descriptor.name(),
            "Item destroyed"
        );
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Borrow the item behind `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignItem`] for a key issued by another store and
    /// [`Error::StaleItem`] if the item was destroyed.
    pub fn item<T: ItemValue>(&self, key: ItemKey<T>) -> Result<&DataItem<T>> {
        self.check_owner(key.store, key.id)?;
        self.items
            .get(key.id)
            .and_then(|stored| stored.as_any().downcast_ref::<DataItem<T>>())
            .ok_or(Error::StaleItem(key.id))
    }

    /// Key of the item called `name`, if it exists and holds a `T`
    pub fn find<T: ItemValue>(&self, name: &str) -> Option<ItemKey<T>> {
        let id = *self.names.get(name)?;
        let stored = self.items.get(id)?;
        stored
            .descriptor()
            .holds::<T>()
            .then(|| ItemKey::new(self.id, id))
    }

    /// Whether `id` names an item this store currently owns
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.get(id).is_some()
    }

    /// Lifecycle state of the item `id` names, from this store's view
    ///
    /// Ids that no longer resolve report [`ItemState::Destroyed`].
    pub fn state_of(&self, id: ItemId) -> ItemState {
        if self.items.get(id).is_some() {
            ItemState::Live
        } else {
            ItemState::Destroyed
        }
    }

    /// Number of owned items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store owns no items
    pub fn is_empty(&self) -> bool {
        self.items.len() == 0
    }

    /// Ids of every owned item
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.descriptor().id()).collect()
    }

    /// Names of every owned item
    pub fn item_names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.descriptor().name()).collect()
    }

    /// Store id
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Store name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the store was built from
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn check_owner(&self, owner: StoreId, item: ItemId) -> Result<()> {
        if owner == self.id {
            Ok(())
        } else {
            Err(Error::ForeignItem {
                item,
                owner,
                store: self.id,
            })
        }
    }

    // ========================================================================
    // Affinity
    // ========================================================================

    /// The store's current scheduling domain binding
    pub fn affinity(&self) -> Affinity {
        self.affinity.read().clone()
    }

    /// Rebind the store and every item it owns to `affinity`
    ///
    /// Items created later inherit the new binding. Rebinding to the
    /// domain already in use does nothing.
    pub fn set_affinity(&self, affinity: Affinity) {
        let mut current = self.affinity.write();
        if current.same_domain(&affinity) {
            return;
        }

        let store_source = TriggerSource::Store(self.id);
        current.unsubscribe(store_source);
        for item in self.items.iter() {
            current.unsubscribe(item.source());
        }

        let signal = self.signal_weak();
        affinity.subscribe(store_source, signal.clone());
        for item in self.items.iter() {
            item.bind_affinity(&affinity);
            affinity.subscribe(item.source(), signal.clone());
        }

        debug!(
            store = %self.id,
            from = ?*current,
            to = ?affinity,
            items = self.items.len(),
            "Store affinity changed"
        );
        *current = affinity;
    }

    fn signal_weak(&self) -> Weak<dyn Triggerable> {
        Arc::downgrade(&self.signal) as Weak<dyn Triggerable>
    }

    // ========================================================================
    // Triggering
    // ========================================================================

    /// Register model logic to run when the store executes after a trigger
    ///
    /// Hooks receive the number of triggers coalesced into this execution.
    /// They run while the hook list is locked and must not register further
    /// hooks on the same store.
    pub fn on_execute(&self, hook: impl FnMut(u64) + Send + 'static) {
        self.signal.hooks.lock().push(Box::new(hook));
    }

    /// Trigger the store itself through its affinity
    ///
    /// Returns whether a bound domain accepted the trigger.
    pub fn trigger(&self) -> bool {
        let sequence = self.store_triggers.fetch_add(1, Ordering::AcqRel) + 1;
        self.affinity
            .read()
            .trigger(TriggerEvent::new(TriggerSource::Store(self.id), sequence))
    }

    /// Whether a trigger has arrived since the last execution
    pub fn is_triggered(&self) -> bool {
        self.signal.triggered.load(Ordering::Acquire)
    }

    /// Run the model hooks if the store was triggered
    ///
    /// Returns whether the hooks ran.
    pub fn execute_if_triggered(&self) -> bool {
        self.signal.execute()
    }

    /// Number of executions that ran the model hooks
    pub fn executions(&self) -> u64 {
        self.signal.executions.load(Ordering::Relaxed)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Triggerable for DataStore {
    fn on_trigger(&self, event: &TriggerEvent) {
        self.signal.on_trigger(event);
    }

    fn on_execute_if_triggered(&self) {
        self.signal.execute();
    }

    fn on_affinity(&self, affinity: &Affinity) {
        self.set_affinity(affinity.clone());
    }
}

impl Drop for DataStore {
    fn drop(&mut self) {
        let items = self.items.drain();
        let released = items.len();
        for item in items {
            self.release(item);
        }
        self.affinity
            .read()
            .unsubscribe(TriggerSource::Store(self.id));
        info!(store = %self.id, name = %self.config.name, released, "Data store dropped");
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("items", &self.items.len())
            .field("affinity", &*self.affinity.read())
            .finish()
    }
}

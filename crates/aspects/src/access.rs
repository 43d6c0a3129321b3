//! What an aspect sees of a guarded access

use dmodel_core::{ItemId, StoreId};
use std::any::{Any, TypeId};

/// Static description of a data item, fixed at construction
///
/// Aspect factories receive it to decide which aspects to attach; every
/// hook receives it again through [`Access::item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    store: StoreId,
    id: ItemId,
    name: String,
    type_name: &'static str,
    type_id: TypeId,
    size: usize,
}

impl ItemDescriptor {
    /// Describe an item holding values of type `T`
    pub fn new<T: Any>(store: StoreId, id: ItemId, name: impl Into<String>) -> Self {
        Self {
            store,
            id,
            name: name.into(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: std::mem::size_of::<T>(),
        }
    }

    /// Owning store
    pub fn store(&self) -> StoreId {
        self.store
    }

    /// Item id within the store
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Item name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the stored value type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the item stores values of type `T`
    pub fn holds<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Size in bytes of the stored value type
    pub fn size(&self) -> usize {
        self.size
    }
}

/// One guarded access as presented to an aspect hook
///
/// For writes `value` is the candidate; for reads it is the value currently
/// stored in the item.
///
/// An access entering an [`crate::AspectChain`] is stamped with a ticket
/// unique to that pass through the chain. The pre and post hooks of one
/// access see the same ticket; an `Access` built outside a chain carries
/// ticket 0.
#[derive(Clone, Copy)]
pub struct Access<'a> {
    item: &'a ItemDescriptor,
    value: &'a dyn Any,
    ticket: u64,
}

impl<'a> Access<'a> {
    /// Wrap a value of the item's type
    pub fn new<T: Any>(item: &'a ItemDescriptor, value: &'a T) -> Self {
        Self {
            item,
            value,
            ticket: 0,
        }
    }

    pub(crate) fn stamped(self, ticket: u64) -> Self {
        Self { ticket, ..self }
    }

    /// Ticket of the chain pass this access belongs to, 0 if none
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// The item being accessed
    pub fn item(&self) -> &'a ItemDescriptor {
        self.item
    }

    /// The value under inspection, type-erased
    pub fn value(&self) -> &'a dyn Any {
        self.value
    }

    /// The value under inspection, if it is a `T`
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        self.value.downcast_ref::<T>()
    }

    /// Size in bytes of the value
    pub fn size(&self) -> usize {
        self.item.size()
    }
}

impl std::fmt::Debug for Access<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Access")
            .field("item", &self.item.id())
            .field("name", &self.item.name())
            .field("type", &self.item.type_name())
            .field("size", &self.item.size())
            .field("ticket", &self.ticket)
            .finish()
    }
}

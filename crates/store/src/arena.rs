//! Generational slot arena for the items a store owns.
//!
//! A slot's generation is bumped when its item is removed, so an
//! [`ItemId`] naming a destroyed item never resolves to whatever reuses
//! the slot later.

use crate::item::StoredItem;
use dmodel_core::ItemId;

struct Slot {
    generation: u32,
    item: Option<Box<dyn StoredItem>>,
}

#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert the item built by `build`, which receives the id it will live under
    ///
    /// Returns `None`, without calling `build`, once every `u32` slot index
    /// is occupied.
    pub(crate) fn insert_with(
        &mut self,
        build: impl FnOnce(ItemId) -> Box<dyn StoredItem>,
    ) -> Option<ItemId> {
        let id = match self.free.pop() {
            Some(index) => ItemId::new(index, self.slots[index as usize].generation),
            None => {
                let index = u32::try_from(self.slots.len()).ok()?;
                self.slots.push(Slot {
                    generation: 0,
                    item: None,
                });
                ItemId::new(index, 0)
            }
        };
        self.slots[id.index() as usize].item = Some(build(id));
        self.len += 1;
        Some(id)
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&dyn StoredItem> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.item.as_deref()
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Box<dyn StoredItem>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let item = slot.item.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(item)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn StoredItem> + '_ {
        self.slots.iter().filter_map(|slot| slot.item.as_deref())
    }

    /// Remove every item, in creation-slot order
    pub(crate) fn drain(&mut self) -> Vec<Box<dyn StoredItem>> {
        let mut drained = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(item) = slot.item.take() {
                slot.generation = slot.generation.wrapping_add(1);
                // insert_with never grows the arena past u32::MAX slots
                debug_assert!(u32::try_from(index).is_ok());
                self.free.push(index as u32);
                drained.push(item);
            }
        }
        self.len = 0;
        drained
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

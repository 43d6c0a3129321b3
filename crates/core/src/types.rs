//! Core identifier types
//!
//! - [`StoreId`]: unique identity of a data store (UUID v4)
//! - [`ItemId`]: generational slot index of a data item within its store

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a data store
///
/// A StoreId is a wrapper around a UUID v4. Every handle a store issues
/// carries the issuing store's id, so a handle presented to the wrong store
/// is detected instead of resolving to an unrelated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Create a new random StoreId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a StoreId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get the raw bytes of this StoreId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a data item within its store
///
/// `index` addresses the arena slot; `generation` is bumped every time the
/// slot is reused, so an id held past `destroy` never aliases the slot's
/// next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    /// Create an id from a slot index and generation
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at allocation time
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}.{}", self.index, self.generation)
    }
}

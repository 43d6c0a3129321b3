//! Data items and data stores for dmodel
//!
//! - DataItem: typed value cell whose every access runs its aspect chain
//! - DataStore: creates, owns, binds and destroys data items
//! - ItemKey: typed, store-checked handle to an item
//! - DataStoreBuilder: fluent store configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
pub mod builder;
pub mod item;
pub mod store;

pub use builder::DataStoreBuilder;
pub use item::{DataItem, ItemState, ItemValue};
pub use store::{DataStore, ItemKey};

//! dmodel - guarded data items for cooperative domain models
//!
//! A domain model keeps its state in data items. Every item is a typed value
//! cell owned by a data store; every read and write of it runs the item's
//! aspect chain, and every stored write triggers the logic that depends on
//! the item through the store's scheduling domain.
//!
//! # Quick Start
//!
//! ```ignore
//! use dmodel::{Affinity, CooperativeDomain, DataStore};
//!
//! let domain = CooperativeDomain::shared("model");
//! let mut store = DataStore::builder()
//!     .name("vehicle")
//!     .affinity(Affinity::new(domain.clone()))
//!     .build()?;
//!
//! let speed = store.create::<f64, _>("speed", 0.0)?;
//! store.item(speed)?.write(12.5);
//! assert_eq!(store.item(speed)?.read()?, 12.5);
//!
//! // Deliver the triggers: the store's model hooks run once.
//! domain.run_pending();
//! ```
//!
//! # Architecture
//!
//! - `dmodel-core`: ids, errors, configuration
//! - `dmodel-runtime`: triggers, scheduling domains, affinity
//! - `dmodel-aspects`: the aspect contract, chains, factories and the
//!   standard aspects
//! - `dmodel-store`: data items and the stores that own them

pub use dmodel_aspects::{
    factory_fn, Access, Aspect, AspectChain, AspectFactory, AuditAspect, AuditStats,
    DefaultAspectFactory, FnFactory, ItemDescriptor, LockAspect, NoAspects, Passage,
    ValidationAspect, AUDIT_ASPECT, LOCK_ASPECT,
};
pub use dmodel_core::{
    AspectConfig, ConfigError, ErrComponent, ErrCondition, ErrSystem, Error, ErrorCode, ItemId,
    Result, StoreConfig, StoreId, SystemError,
};
pub use dmodel_runtime::testing;
pub use dmodel_runtime::{
    Affinity, CooperativeDomain, DomainStats, RunStats, SchedulingDomain, TriggerEvent,
    TriggerSource, Triggerable,
};
pub use dmodel_store::{DataItem, DataStore, DataStoreBuilder, ItemKey, ItemState, ItemValue};
